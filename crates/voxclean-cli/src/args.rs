//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use voxclean_models::Profile;

/// Input keyword selecting the configured input/output/config paths.
pub const AUTO_INPUT: &str = "auto";

/// Command-line arguments for voxclean
#[derive(Parser, Debug, Clone)]
#[command(name = "voxclean")]
#[command(about = "Clean up dialogue audio in video files")]
#[command(version)]
pub struct Args {
    /// Input video file or directory, or `auto` for the configured defaults
    #[arg(required_unless_present = "print_schema")]
    pub input: Option<String>,

    /// Output file or directory (ignored in `auto` mode)
    pub output: Option<PathBuf>,

    /// Filter config file (JSON); ignored in `auto` mode
    #[arg(short, long, conflicts_with = "profile")]
    pub config: Option<PathBuf>,

    /// Analyse each clip and generate its policy with this profile
    #[arg(short, long, value_name = "light|aggressive|studio")]
    pub profile: Option<Profile>,

    /// Check duration and clipping of each output
    #[arg(long)]
    pub validate: bool,

    /// Print the FFmpeg commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Clips processed concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Refuse to replace existing outputs
    #[arg(long)]
    pub no_overwrite: bool,

    /// Print the filter config JSON Schema and exit
    #[arg(long)]
    pub print_schema: bool,
}

impl Args {
    pub fn is_auto(&self) -> bool {
        self.input.as_deref() == Some(AUTO_INPUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_mode() {
        let args = Args::try_parse_from([
            "voxclean",
            "in.mp4",
            "out.mp4",
            "--config",
            "filters.json",
            "--validate",
        ])
        .unwrap();
        assert_eq!(args.input.as_deref(), Some("in.mp4"));
        assert_eq!(args.output, Some(PathBuf::from("out.mp4")));
        assert_eq!(args.config, Some(PathBuf::from("filters.json")));
        assert!(args.validate);
        assert!(!args.is_auto());
    }

    #[test]
    fn test_parse_profile_alias() {
        let args = Args::try_parse_from(["voxclean", "auto", "--profile", "hq"]).unwrap();
        assert!(args.is_auto());
        assert_eq!(args.profile, Some(Profile::Studio));
    }

    #[test]
    fn test_unknown_profile_rejected() {
        assert!(Args::try_parse_from(["voxclean", "in.mp4", "--profile", "loud"]).is_err());
    }

    #[test]
    fn test_config_conflicts_with_profile() {
        let argv = ["voxclean", "a.mp4", "b.mp4", "-c", "f.json", "-p", "light"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_input_required_without_schema_flag() {
        assert!(Args::try_parse_from(["voxclean"]).is_err());
        assert!(Args::try_parse_from(["voxclean", "--print-schema"]).is_ok());
    }
}
