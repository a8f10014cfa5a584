//! Command line interface for npcm-image

use crate::builder::ImageBuilder;
use crate::config::{BuildConfig, ConfigKey};
use crate::error::Result;
use crate::file::read_file;
use crate::image_types::ImageVariant;
use crate::{HEADER_SIZE, VERSION};
use clap::{Parser, Subcommand};
use log::{LevelFilter, debug, info};
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

/// Command line arguments for npcm-image
#[derive(Parser, Debug)]
#[command(name = "npcm-image")]
#[command(version = VERSION)]
#[command(about = "Prepend the NPCM boot ROM header to BootBlock and U-Boot binaries", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - only output errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a boot image from a raw binary
    Create(CreateArgs),
    /// List information about an existing image
    List(ListArgs),
}

/// Arguments for creating an image
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Image variant (bootblock, uboot)
    #[arg(short = 'T', long = "type")]
    pub image_type: String,

    /// Input binary
    #[arg(short = 'd', long)]
    pub data_file: PathBuf,

    /// Output image file
    #[arg(short, long)]
    pub output: PathBuf,

    /// TOML file with header options; command line options take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FIU0 direct read configuration (hexadecimal)
    #[arg(long, alias = "fiu0_drd_cfg")]
    pub fiu0_drd_cfg: Option<String>,

    /// FIU clock divider (hexadecimal)
    #[arg(long, alias = "fiu_clk_divider")]
    pub fiu_clk_divider: Option<String>,

    /// Memory controller frequency in MHz (decimal)
    #[arg(long, alias = "mc_freq")]
    pub mc_freq: Option<String>,

    /// CPU frequency in MHz (decimal)
    #[arg(long, alias = "cpu_freq")]
    pub cpu_freq: Option<String>,

    /// Memory controller configuration bits (hexadecimal)
    #[arg(long, alias = "mc_cfg")]
    pub mc_cfg: Option<String>,

    /// Header version word (hexadecimal)
    #[arg(long, alias = "image_version")]
    pub image_version: Option<String>,

    /// Pad the image with 0xFF to a 4 KiB boundary
    #[arg(long)]
    pub pad: bool,

    /// Print image information after creation
    #[arg(long)]
    pub print_info: bool,
}

impl CreateArgs {
    /// Options given on the command line
    pub fn overrides(&self) -> Result<BuildConfig> {
        let mut config = BuildConfig::new();
        let values = [
            (ConfigKey::Fiu0DrdCfg, &self.fiu0_drd_cfg),
            (ConfigKey::FiuClkDivider, &self.fiu_clk_divider),
            (ConfigKey::McFreq, &self.mc_freq),
            (ConfigKey::CpuFreq, &self.cpu_freq),
            (ConfigKey::McCfg, &self.mc_cfg),
            (ConfigKey::Version, &self.image_version),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                config.set_str(key, value)?;
            }
        }
        if self.pad {
            config.pad = Some(true);
        }
        Ok(config)
    }
}

/// Arguments for listing image information
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Image file to examine
    pub image_file: PathBuf,

    /// Print in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Install the stderr logger at the level selected by `-v`/`-q`
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = SimpleLogger::new().with_level(level).init();
}

/// Main CLI handler
pub fn run_cli(args: Args) -> Result<()> {
    match args.command {
        Commands::Create(create_args) => handle_create(create_args),
        Commands::List(list_args) => handle_list(list_args),
    }
}

fn handle_create(args: CreateArgs) -> Result<()> {
    let variant: ImageVariant = args.image_type.parse()?;
    info!("Creating {} image...", variant);

    let file_config = match &args.config {
        Some(path) => {
            debug!("Loading config from: {}", path.display());
            BuildConfig::from_file(path)?
        }
        None => BuildConfig::default(),
    };
    let config = file_config.merge(&args.overrides()?);
    debug!("Configuration overrides: {:?}", config);

    debug!("Loading data from: {}", args.data_file.display());
    let builder = ImageBuilder::new(variant)
        .config(config)
        .data_from_file(&args.data_file)?;

    let image_data = builder.build()?;

    debug!("Writing image to: {}", args.output.display());
    crate::file::write_file(&args.output, &image_data)?;

    info!("Image created successfully: {}", args.output.display());
    info!("Image size: {} bytes", image_data.len());

    if args.print_info {
        println!("{}", builder.header()?.summary());
    }

    Ok(())
}

/// Header fields as printed by `list --json`
#[derive(Serialize, Debug)]
struct ImageInfo {
    variant: Option<ImageVariant>,
    start_tag: String,
    fiu0_drd_cfg: String,
    fiu_clk_divider: String,
    dest_addr: String,
    code_size: u32,
    version: String,
    header_size: usize,
    trailing: usize,
}

fn handle_list(args: ListArgs) -> Result<()> {
    debug!("Reading image: {}", args.image_file.display());

    let image_data = read_file(&args.image_file)?;
    let parsed = ImageBuilder::from_image(&image_data)?;

    if args.json {
        let header = &parsed.header;
        let info = ImageInfo {
            variant: parsed.variant(),
            start_tag: format!("0x{:016x}", header.start_tag),
            fiu0_drd_cfg: format!("0x{:08x}", header.fiu0_drd_cfg),
            fiu_clk_divider: format!("0x{:02x}", header.fiu_clk_divider),
            dest_addr: format!("0x{:08x}", header.dest_addr),
            code_size: header.code_size,
            version: format!("0x{:08x}", header.version),
            header_size: HEADER_SIZE,
            trailing: parsed.trailing,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        parsed.print_info();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use clap::Parser;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from([
            "npcm-image",
            "create",
            "-T",
            "bootblock",
            "-d",
            "in.bin",
            "-o",
            "out.bin",
            "--fiu0-drd-cfg",
            "030111bd",
            "--pad",
        ])
        .unwrap();

        if let Commands::Create(create_args) = args.command {
            assert_eq!(create_args.image_type, "bootblock");
            assert_eq!(create_args.data_file, PathBuf::from("in.bin"));
            assert_eq!(create_args.fiu0_drd_cfg.as_deref(), Some("030111bd"));
            assert!(create_args.pad);

            let config = create_args.overrides().unwrap();
            assert_eq!(config.fiu0_drd_cfg, Some(0x030111bd));
            assert_eq!(config.pad, Some(true));
            assert_eq!(config.fiu_clk_divider, None);
        } else {
            panic!("Expected Create command");
        }
    }

    #[test]
    fn test_underscore_aliases() {
        let args = Args::try_parse_from([
            "npcm-image",
            "create",
            "-T",
            "uboot",
            "-d",
            "in.bin",
            "-o",
            "out.bin",
            "--fiu_clk_divider=2",
            "--mc_freq=667",
        ])
        .unwrap();

        let Commands::Create(create_args) = args.command else {
            panic!("Expected Create command");
        };
        let config = create_args.overrides().unwrap();
        assert_eq!(config.fiu_clk_divider, Some(2));
        assert_eq!(config.mc_freq, Some(667));
    }

    #[test]
    fn test_malformed_override() {
        let args = Args::try_parse_from([
            "npcm-image",
            "create",
            "-T",
            "bootblock",
            "-d",
            "in.bin",
            "-o",
            "out.bin",
            "--fiu0_drd_cfg=zzz",
        ])
        .unwrap();

        let Commands::Create(create_args) = args.command else {
            panic!("Expected Create command");
        };
        assert!(matches!(
            create_args.overrides(),
            Err(ImageError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_variant_required() {
        assert!(Args::try_parse_from(["npcm-image", "create", "-d", "a", "-o", "b"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["npcm-image", "list", "image.bin", "-q"]).unwrap();
        assert!(args.quiet);
        assert!(!args.verbose);
    }
}
