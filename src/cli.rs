// Command line interface module
// Window geometry and animation knobs for the ticket view

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

/// ticketdrop - a decorative drag-and-drop concert ticket view for Wayland
#[derive(Parser, Debug)]
#[command(name = "ticketdrop")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Initial window width in pixels
    #[arg(long, default_value = "960", value_parser = parse_dimension)]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value = "600", value_parser = parse_dimension)]
    pub height: u32,

    /// Seconds between a drop and the ticket reveal
    #[arg(short, long, default_value = "12", value_parser = parse_delay)]
    pub delay: f64,

    /// Number of background points
    #[arg(long, default_value = "40")]
    pub points: usize,

    /// Disable GPU rendering and use CPU rendering only
    #[arg(long, default_value = "false")]
    pub cpu: bool,
}

/// Parsed arguments with derived values resolved
#[derive(Debug)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
    pub delay: Duration,
    pub points: usize,
    /// Use GPU rendering (default true, set to false with --cpu)
    pub use_gpu: bool,
}

/// Parse a window dimension and keep it within sane surface limits
fn parse_dimension(s: &str) -> Result<u32, String> {
    let dim: u32 = s.parse().map_err(|_| "Invalid dimension value")?;
    if !(200..=4096).contains(&dim) {
        return Err("Window dimensions must be between 200 and 4096".to_string());
    }
    Ok(dim)
}

/// Parse the reveal delay and ensure it is positive
fn parse_delay(s: &str) -> Result<f64, String> {
    let delay: f64 = s.parse().map_err(|_| "Invalid delay value")?;
    if !delay.is_finite() || delay <= 0.0 {
        return Err("Delay must be a positive number of seconds".to_string());
    }
    Ok(delay)
}

/// Parse command line arguments
pub fn parse_args() -> Result<ViewConfig> {
    let args = Args::parse();

    Ok(ViewConfig {
        width: args.width,
        height: args.height,
        delay: Duration::from_secs_f64(args.delay),
        points: args.points,
        use_gpu: !args.cpu, // GPU is default, --cpu disables it
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_must_be_positive() {
        assert!(parse_delay("12").is_ok());
        assert!(parse_delay("0.5").is_ok());
        assert!(parse_delay("0").is_err());
        assert!(parse_delay("-3").is_err());
        assert!(parse_delay("NaN").is_err());
    }

    #[test]
    fn dimensions_are_bounded() {
        assert!(parse_dimension("960").is_ok());
        assert!(parse_dimension("199").is_err());
        assert!(parse_dimension("5000").is_err());
    }

    #[test]
    fn defaults_are_the_documented_ones() {
        let args = Args::parse_from(["ticketdrop"]);
        assert_eq!(args.width, 960);
        assert_eq!(args.height, 600);
        assert_eq!(args.delay, 12.0);
        assert_eq!(args.points, 40);
        assert!(!args.cpu);
    }
}
