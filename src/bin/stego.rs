//! # Steganography CLI
//!
//! ```bash
//! stego embed --input face.jpg --output avatar.png --name Ada --voice-model alloy
//! stego embed --input face.png --output out.png --text "hello"
//! stego extract --input avatar.png --profile
//! stego capacity --input face.jpg
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use avatar_stego::avatar::AvatarProfile;
use avatar_stego::common::logging::init_logger;
use avatar_stego::processing::lsb::{self, CharPolicy};
use avatar_stego::processing::steganography;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide text or an avatar profile in an image, writing a PNG
    Embed(EmbedArgs),
    /// Print the text hidden in an image
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        /// Parse the hidden text as an avatar profile and pretty-print it
        #[arg(long)]
        profile: bool,
    },
    /// Show how much text an image can hold
    Capacity {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct EmbedArgs {
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; must end in .png
    #[arg(short, long)]
    output: PathBuf,

    /// Raw text to embed instead of an avatar profile
    #[arg(long, conflicts_with_all = ["name", "personality", "background_knowledge", "voice_model"])]
    text: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value = "")]
    personality: String,

    #[arg(long, default_value = "")]
    background_knowledge: String,

    #[arg(long, default_value = "")]
    voice_model: String,

    /// Refuse characters above U+00FF instead of truncating them
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Command::Embed(args) => embed(args),
        Command::Extract { input, profile } => extract(input, profile),
        Command::Capacity { input } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let bits = steganography::capacity_of(&bytes)?;
            let chars = bits.saturating_sub(lsb::MARKER_BITS) / lsb::BITS_PER_CHAR;
            println!("{} bits ({} characters)", bits, chars);
            Ok(())
        }
    }
}

fn embed(args: EmbedArgs) -> Result<()> {
    let text = match (args.text, args.name) {
        (Some(text), _) => text,
        (None, Some(name)) => AvatarProfile {
            name,
            personality: args.personality,
            background_knowledge: args.background_knowledge,
            voice_model: args.voice_model,
        }
        .to_payload()?,
        (None, None) => bail!("either --text or --name is required"),
    };

    let policy = if args.strict {
        CharPolicy::Reject
    } else {
        CharPolicy::Truncate
    };

    if !args.strict && text.chars().any(|c| u32::from(c) > 0xFF) {
        warn!("Characters above U+00FF will be truncated to their low byte");
    }

    steganography::embed_text(&args.input, &text, &args.output, policy)
        .with_context(|| format!("failed to embed into {}", args.input.display()))?;

    info!(
        "✅ Embedded {} characters into {}",
        text.encode_utf16().count(),
        args.output.display()
    );
    Ok(())
}

fn extract(input: PathBuf, as_profile: bool) -> Result<()> {
    let Some(text) = steganography::extract_text(&input)
        .with_context(|| format!("failed to read {}", input.display()))?
    else {
        bail!("no embedded data found in {}", input.display());
    };

    if as_profile {
        let profile = AvatarProfile::from_payload(&text)
            .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}
