use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Quarry: blob self-tests, compression envelopes and artifact storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with `[io]` and `[store]` settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check every byte classifier against its definition
    TestIsspace,
    /// Compress and decompress files, checking the round trip
    TestCompress(TestCompressArgs),
    /// Compress two files as one stream and check the concatenation
    #[command(name = "test-compress-2")]
    TestCompress2(TestCompress2Args),
    /// Copy input to output, dropping lines that begin with `#`
    TestStripCommentLines(StripArgs),
    /// Show how arguments are escaped for the shell
    TestEscapedArg(EscapedArgArgs),
    /// Wrap a file in a compression envelope
    Compress(TransformArgs),
    /// Unwrap a compression envelope
    Uncompress(TransformArgs),
    /// Convert a file to CRLF and back, checking nothing is lost
    TestCycleCrlf(CycleArgs),
    /// Store a file as an artifact
    Put(PutArgs),
    /// Retrieve an artifact by its hash
    Get(GetArgs),
}

#[derive(Args)]
pub struct TestCompressArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct TestCompress2Args {
    pub first: PathBuf,
    pub second: PathBuf,
}

#[derive(Args)]
pub struct StripArgs {
    #[arg(default_value = "-")]
    pub input: PathBuf,
    #[arg(default_value = "-")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct EscapedArgArgs {
    pub args: Vec<String>,
    /// Treat arguments as file names
    #[arg(long)]
    pub filename: bool,
    /// Quote for cmd.exe instead of the host shell
    #[arg(long)]
    pub windows: bool,
    /// Escape N random arguments and check that `sh` reproduces them
    #[arg(long, value_name = "N")]
    pub fuzz: Option<usize>,
}

#[derive(Args)]
pub struct TransformArgs {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CycleArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub store: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
    #[arg(long)]
    pub store: PathBuf,
    #[arg(default_value = "-")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_test_isspace() {
        let cli = Cli::try_parse_from(["quarry", "test-isspace"]).unwrap();
        assert!(matches!(cli.command, Command::TestIsspace));
    }

    #[test]
    fn parse_test_compress_needs_files() {
        assert!(Cli::try_parse_from(["quarry", "test-compress"]).is_err());
        let cli = Cli::try_parse_from(["quarry", "test-compress", "a", "b"]).unwrap();
        if let Command::TestCompress(args) = cli.command {
            assert_eq!(args.files, vec![PathBuf::from("a"), PathBuf::from("b")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_test_compress_2() {
        let cli = Cli::try_parse_from(["quarry", "test-compress-2", "x", "y"]).unwrap();
        assert!(matches!(cli.command, Command::TestCompress2(_)));
    }

    #[test]
    fn parse_strip_defaults_to_std_streams() {
        let cli = Cli::try_parse_from(["quarry", "test-strip-comment-lines"]).unwrap();
        if let Command::TestStripCommentLines(args) = cli.command {
            assert_eq!(args.input, PathBuf::from("-"));
            assert_eq!(args.output, PathBuf::from("-"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_escaped_arg_flags() {
        let cli = Cli::try_parse_from([
            "quarry", "test-escaped-arg", "--filename", "--windows", "-x", "y z",
        ]);
        // Bare `-x` is taken as an unknown flag; arguments like it go after `--`.
        assert!(cli.is_err());
        let cli = Cli::try_parse_from([
            "quarry", "test-escaped-arg", "--filename", "--windows", "--", "-x", "y z",
        ])
        .unwrap();
        if let Command::TestEscapedArg(args) = cli.command {
            assert!(args.filename && args.windows);
            assert_eq!(args.args, ["-x", "y z"]);
            assert!(args.fuzz.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_fuzz() {
        let cli = Cli::try_parse_from(["quarry", "test-escaped-arg", "--fuzz", "50"]).unwrap();
        if let Command::TestEscapedArg(args) = cli.command {
            assert_eq!(args.fuzz, Some(50));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get_with_store() {
        let cli = Cli::try_parse_from(["quarry", "get", "abc", "--store", "/tmp/s"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.id, "abc");
            assert_eq!(args.store, PathBuf::from("/tmp/s"));
            assert_eq!(args.output, PathBuf::from("-"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn put_requires_store() {
        assert!(Cli::try_parse_from(["quarry", "put", "file"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "quarry", "--verbose", "compress", "in", "out", "--config", "q.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("q.toml")));
    }
}
