use std::io::Write;
use std::path::Path;
use std::process;

use anyhow::{bail, Context};
use colored::Colorize;
use quarry_blob::{charclass, Blob, Output, ShellFlavor};
use quarry_compress::{compress, compress_concat, decompress};
use quarry_io::{read_file, write_file, SymlinkPolicy};
use quarry_store::{ContentStore, DirContentStore};
use quarry_types::ArtifactId;
use rand::Rng;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::TestIsspace => cmd_test_isspace(out),
        Command::TestCompress(args) => cmd_test_compress(&config, args, out),
        Command::TestCompress2(args) => cmd_test_compress_2(&config, args, out),
        Command::TestStripCommentLines(args) => cmd_strip_comment_lines(&config, args, out),
        Command::TestEscapedArg(args) => cmd_escaped_arg(args, out),
        Command::Compress(args) => {
            let input = read(&args.input, &config)?;
            emit(&compress(&input), &args.output, out)
        }
        Command::Uncompress(args) => {
            let input = read(&args.input, &config)?;
            let content = decompress(&input)
                .with_context(|| format!("{} is not a compressed envelope", args.input.display()))?;
            emit(&content, &args.output, out)
        }
        Command::TestCycleCrlf(args) => cmd_cycle_crlf(&config, args, out),
        Command::Put(args) => cmd_put(&config, args, out),
        Command::Get(args) => cmd_get(&config, args, out),
    }
}

fn read(path: &Path, config: &CliConfig) -> anyhow::Result<Blob<'static>> {
    let mut blob = Blob::new();
    read_file(&mut blob, path, SymlinkPolicy::Follow, &config.io)?;
    Ok(blob)
}

/// Send `blob` to `path`, or to the command's output for `-`.
fn emit(blob: &Blob<'_>, path: &Path, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    if path.as_os_str() == "-" {
        out.append(blob.as_bytes())?;
    } else {
        write_file(blob, path)?;
    }
    Ok(())
}

fn cmd_test_isspace(out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let bad = charclass::self_check();
    if !bad.is_empty() {
        bail!("byte classification is wrong for {} byte values: {:02x?}", bad.len(), bad);
    }
    writeln!(out, "{} all 256 byte values classified correctly", "✓".green().bold())?;
    Ok(())
}

fn cmd_test_compress(
    config: &CliConfig,
    args: TestCompressArgs,
    out: &mut Output<'_, '_>,
) -> anyhow::Result<()> {
    for path in &args.files {
        let input = read(path, config)?;
        let envelope = compress(&input);
        let back = decompress(&envelope)?;
        if back != input {
            bail!("{}: decompressed content differs from the original", path.display());
        }
        writeln!(
            out,
            "{}: {} bytes -> {} bytes {}",
            path.display(),
            input.len(),
            envelope.len(),
            "ok".green()
        )?;
    }
    Ok(())
}

fn cmd_test_compress_2(
    config: &CliConfig,
    args: TestCompress2Args,
    out: &mut Output<'_, '_>,
) -> anyhow::Result<()> {
    let first = read(&args.first, config)?;
    let second = read(&args.second, config)?;
    let envelope = compress_concat(&first, &second);
    let back = decompress(&envelope)?;

    let mut expected = first.to_owned_blob();
    expected.append(second.as_bytes());
    if back != expected {
        bail!("decompressed content differs from the concatenation");
    }
    writeln!(
        out,
        "{} + {} bytes -> {} bytes {}",
        first.len(),
        second.len(),
        envelope.len(),
        "ok".green()
    )?;
    Ok(())
}

fn cmd_strip_comment_lines(
    config: &CliConfig,
    args: StripArgs,
    out: &mut Output<'_, '_>,
) -> anyhow::Result<()> {
    let input = read(&args.input, config)?;
    let mut stripped = Blob::new();
    input.strip_comment_lines(&mut stripped);
    emit(&stripped, &args.output, out)
}

fn cmd_escaped_arg(args: EscapedArgArgs, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let flavor = if args.windows {
        ShellFlavor::Windows
    } else {
        ShellFlavor::host()
    };
    for arg in &args.args {
        let mut command = Blob::from("echo");
        command.append_escaped_arg_with(flavor, arg.as_bytes(), args.filename);
        writeln!(out, "{} {}", "input: ".dimmed(), arg)?;
        writeln!(out, "{} {}", "output:".dimmed(), command.to_str_lossy())?;
    }
    if let Some(count) = args.fuzz {
        if flavor != ShellFlavor::Posix || !cfg!(unix) {
            bail!("--fuzz runs arguments through sh and needs a POSIX host");
        }
        fuzz_escaping(count, args.filename, out)?;
    }
    Ok(())
}

fn random_arg(rng: &mut impl Rng) -> String {
    const WIDE: [char; 6] = ['\u{e9}', '\u{df}', '\u{a0}', '\u{20ac}', '\u{4e2d}', '\u{1f600}'];
    let len = rng.gen_range(0..=12);
    let mut arg = String::with_capacity(len * 2);
    for _ in 0..len {
        if rng.gen_ratio(1, 8) {
            arg.push(WIDE[rng.gen_range(0..WIDE.len())]);
        } else {
            arg.push(char::from(rng.gen_range(0x20u8..0x7F)));
        }
    }
    arg
}

/// Escape `count` random arguments, have `sh` print each one back, and
/// compare with what went in.
fn fuzz_escaping(count: usize, filename: bool, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    for i in 0..count {
        let arg = random_arg(&mut rng);
        let mut command = Blob::from("printf %s");
        command.append_escaped_arg_with(ShellFlavor::Posix, arg.as_bytes(), filename);
        let line = command.to_str_lossy();
        debug!(%line, "fuzz");

        let result = process::Command::new("sh")
            .arg("-c")
            .arg(&*line)
            .output()
            .context("cannot run sh")?;
        let expected = if filename && arg.starts_with('-') {
            format!("./{arg}")
        } else {
            arg.clone()
        };
        if result.stdout != expected.as_bytes() {
            bail!(
                "fuzz case {i}: [{arg}] became [{line}], which sh printed as [{}]",
                String::from_utf8_lossy(&result.stdout)
            );
        }
    }
    writeln!(out, "{} {count} random arguments survived sh", "✓".green().bold())?;
    Ok(())
}

fn cmd_cycle_crlf(config: &CliConfig, args: CycleArgs, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let mut lf = read(&args.file, config)?;
    lf.to_lf_only();
    let mut cycled = lf.to_owned_blob();
    cycled.add_cr();
    let crlf_len = cycled.len();
    cycled.to_lf_only();
    if cycled != lf {
        bail!("{}: CRLF round trip changed the content", args.file.display());
    }
    writeln!(
        out,
        "{}: {} lines, {} bytes LF, {} bytes CRLF {}",
        args.file.display(),
        lf.line_count(),
        lf.len(),
        crlf_len,
        "ok".green()
    )?;
    Ok(())
}

fn cmd_put(config: &CliConfig, args: PutArgs, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let content = read(&args.file, config)?;
    let store = DirContentStore::open(&args.store, config.store.clone())?;
    let id = store.put(&content)?;
    writeln!(out, "{id}")?;
    Ok(())
}

fn cmd_get(config: &CliConfig, args: GetArgs, out: &mut Output<'_, '_>) -> anyhow::Result<()> {
    let id: ArtifactId = args
        .id
        .parse()
        .with_context(|| format!("{} is not an artifact hash", args.id))?;
    let store = DirContentStore::open(&args.store, config.store.clone())?;
    let content = store.get_required(&id)?;
    emit(&content, &args.output, out)
}
