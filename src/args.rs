use std::path::PathBuf;

use clap::Parser;

use crate::config::CloakConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Camera index, overrides the config file
    #[arg(long)]
    pub camera: Option<u32>,

    /// Recording path, overrides the config file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also save the captured background as an image
    #[arg(long)]
    pub save_background: Option<PathBuf>,

    /// List available cameras and exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    pub fn apply(&self, config: &mut CloakConfig) {
        if let Some(index) = self.camera {
            config.camera.device_index = index;
        }
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config() {
        let args = Args::parse_from(["invisible-cloak", "--camera", "3", "-o", "clip.avi"]);
        let mut config = CloakConfig::default();
        args.apply(&mut config);
        assert_eq!(config.camera.device_index, 3);
        assert_eq!(config.output.path, PathBuf::from("clip.avi"));
    }

    #[test]
    fn no_flags_leave_the_config_alone() {
        let args = Args::parse_from(["invisible-cloak"]);
        let mut config = CloakConfig::default();
        args.apply(&mut config);
        assert_eq!(config, CloakConfig::default());
        assert!(!args.list);
    }
}
