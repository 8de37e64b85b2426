use std::{net::IpAddr, path::PathBuf, time::Duration};

use byte_unit::{Byte, ByteError};
use clap::{ArgAction, Parser};
use hyper::http::{header::InvalidHeaderValue, HeaderValue};
use log::LevelFilter;

use crate::{archive::process::Archiver, config::Config, storage::Root};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Options {
    /// Increase logs verbosity (Error (default), Warn, Info, Debug, Trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub log_level: u8,
    /// Directory containing the directories served as archives.
    #[arg(short = 'r', long, default_value = ".")]
    pub root: PathBuf,
    /// HTTP listening address.
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    pub address: IpAddr,
    /// HTTP listening port.
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,
    /// Command writing the archive of its working directory to its standard output.
    #[arg(short = 'A', long, default_value = "zip -r -q - .", allow_hyphen_values = true)]
    pub archiver: Archiver,
    /// Size of the chunks read from the archiver and sent to the client.
    #[arg(short = 'c', long, default_value = "800KiB", value_parser(parse_chunk_size))]
    pub chunk_size: u64,
    /// Maximum duration of a download.
    #[arg(short = 't', long, default_value = "1h", value_parser(humantime::parse_duration))]
    pub timeout: Duration,
    /// Extension of the archives' filenames.
    #[arg(short = 'e', long, default_value = "zip")]
    pub extension: String,
    /// Content type of the archives.
    #[arg(short = 'm', long, default_value = "application/zip", value_parser(parse_content_type))]
    pub content_type: HeaderValue,
}

impl Options {
    pub fn log_level(&self) -> LevelFilter {
        use LevelFilter::*;
        match self.log_level {
            0 => Error,
            1 => Warn,
            2 => Info,
            3 => Debug,
            _ => Trace,
        }
    }

    pub fn config(&self, root: Root) -> Config {
        Config {
            root,
            archiver: self.archiver.clone(),
            chunk_size: self.chunk_size as usize,
            timeout: self.timeout,
            extension: self.extension.clone(),
            content_type: self.content_type.clone(),
        }
    }
}

fn parse_chunk_size(s: &str) -> Result<u64, String> {
    let size = s
        .parse::<Byte>()
        .map_err(|err: ByteError| err.to_string())?
        .get_bytes();
    if size == 0 || size > u32::MAX as u64 {
        return Err("chunk size must be between 1 byte and 4GiB".to_owned());
    }
    Ok(size)
}

fn parse_content_type(s: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(s)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::{error::ErrorKind, Parser};

    use super::Options;
    use crate::archive::process::Archiver;

    macro_rules! cmd {
        ($($arg:tt)*) => {
            {
                Options::try_parse_from([
                    "dirstream",
                    $($arg)*
                ])
            }
        }
    }

    #[test]
    fn defaults() {
        let options = cmd![].unwrap();
        assert_eq!(options.root.to_str(), Some("."));
        assert_eq!(options.port, 8080);
        assert_eq!(options.archiver, Archiver::default());
        assert_eq!(options.chunk_size, 800 * 1024);
        assert_eq!(options.timeout, Duration::from_secs(3600));
        assert_eq!(options.extension, "zip");
        assert_eq!(options.content_type, "application/zip");
        assert_eq!(options.log_level(), log::LevelFilter::Error);
    }

    #[test]
    fn archiver() {
        // Command line split on whitespace.
        assert_eq!(
            cmd!["--archiver", "tar -cf - ."].unwrap().archiver,
            Archiver::new("tar", ["-cf", "-", "."])
        );

        // Empty command.
        assert_eq!(
            cmd!["--archiver", " "].unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn chunk_size() {
        assert_eq!(cmd!["-c", "4KiB"].unwrap().chunk_size, 4096);
        assert_eq!(cmd!["--chunk-size", "1"].unwrap().chunk_size, 1);

        // Zero sized chunks.
        assert_eq!(
            cmd!["--chunk-size", "0"].unwrap_err().kind(),
            ErrorKind::ValueValidation
        );

        // Not a size.
        assert_eq!(
            cmd!["--chunk-size", "big"].unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn timeout() {
        assert_eq!(
            cmd!["--timeout", "90s"].unwrap().timeout,
            Duration::from_secs(90)
        );
        assert_eq!(
            cmd!["-t", "forever"].unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn verbosity() {
        assert_eq!(cmd!["-vv"].unwrap().log_level(), log::LevelFilter::Info);
        assert_eq!(cmd!["-vvvvv"].unwrap().log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn content_type() {
        let options = cmd!["--extension", "tar", "--content-type", "application/x-tar"].unwrap();
        assert_eq!(options.extension, "tar");
        assert_eq!(options.content_type, "application/x-tar");

        assert_eq!(
            cmd!["--content-type", "bad\nvalue"].unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }
}
