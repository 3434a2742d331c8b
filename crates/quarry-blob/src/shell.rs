//! Quoting of subprocess arguments.
//!
//! Arguments are checked byte by byte against a per-shell class table.
//! Control characters are rejected outright, and so is anything that is not
//! well-formed UTF-8: both are fatal, since an argument that cannot be
//! quoted safely must never reach a shell. Arguments used as file names
//! that begin with `-` are prefixed with `./` so a subprocess cannot
//! mistake them for options.
//!
//! Two ways to pass arguments are offered. [`Blob::append_escaped_arg`]
//! builds a command line as text. [`defuse_filename_arg`] is for callers
//! that spawn with an argv array and need no quoting at all.

use std::borrow::Cow;

use crate::blob::Blob;
use crate::charclass::is_space;
use crate::fatal;

/// Which shell a command line is built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShellFlavor {
    /// `sh` and friends: single quotes, or backslashes when the argument
    /// itself contains a single quote.
    #[cfg_attr(not(windows), default)]
    Posix,
    /// `cmd.exe`: double quotes, with embedded `"` doubled.
    #[cfg_attr(windows, default)]
    Windows,
}

impl ShellFlavor {
    /// The flavor of the platform this binary runs on.
    pub fn host() -> Self {
        Self::default()
    }

    fn table(self) -> &'static [u8; 256] {
        match self {
            Self::Posix => &POSIX_CLASS,
            Self::Windows => &WINDOWS_CLASS,
        }
    }

    fn dash_prefix(self) -> &'static [u8] {
        match self {
            Self::Posix => b"./",
            Self::Windows => b".\\",
        }
    }
}

const SAFE: u8 = 0;
const QUOTE: u8 = 1;
const ILLEGAL: u8 = 2;
// Lead bytes of multi-byte UTF-8 carry 2 + the number of continuation bytes.
const LEAD_2: u8 = 3;
const LEAD_3: u8 = 4;
const LEAD_4: u8 = 5;

static POSIX_CLASS: [u8; 256] = build_class(b" !\"#$%&'()*;<>?[\\]^`{|}~");
static WINDOWS_CLASS: [u8; 256] = build_class(b" \"%&'();<>^|`!");

const fn build_class(special: &[u8]) -> [u8; 256] {
    let mut table = [SAFE; 256];
    let mut c = 0usize;
    while c < 256 {
        table[c] = match c as u8 {
            0x00..=0x1F | 0x7F => ILLEGAL,
            0x80..=0xBF => ILLEGAL,
            0xC0..=0xDF => LEAD_2,
            0xE0..=0xEF => LEAD_3,
            0xF0..=0xF7 => LEAD_4,
            0xF8..=0xFF => ILLEGAL,
            _ => SAFE,
        };
        c += 1;
    }
    let mut i = 0;
    while i < special.len() {
        table[special[i] as usize] = QUOTE;
        i += 1;
    }
    table
}

/// Validate `arg` against `table`. Returns `true` if some byte needs
/// quoting. Fatal on a control character or malformed UTF-8; `command`,
/// when known, names the command line the argument was meant for.
fn scan(arg: &[u8], table: &[u8; 256], command: Option<&str>) -> bool {
    let target = match command {
        Some(name) => format!(" to the \"{name}\" command"),
        None => String::new(),
    };
    let mut needs_quoting = false;
    let mut i = 0;
    while i < arg.len() {
        let class = table[arg[i] as usize];
        match class {
            SAFE => {}
            QUOTE => needs_quoting = true,
            ILLEGAL => fatal!(
                "the [{}] argument{target} contains a character (ascii 0x{:02x}) \
                 that is not allowed in shell arguments",
                String::from_utf8_lossy(arg),
                arg[i]
            ),
            lead => {
                needs_quoting = true;
                let continuations = usize::from(lead - ILLEGAL);
                let end = i + continuations;
                if end >= arg.len() || !arg[i + 1..=end].iter().all(|&b| (0x80..=0xBF).contains(&b)) {
                    fatal!(
                        "the [{}] argument{target} contains an illegal UTF-8 character",
                        String::from_utf8_lossy(arg)
                    );
                }
                i = end;
            }
        }
        i += 1;
    }
    needs_quoting
}

/// Prepare a file name for an argv-style spawn: no quoting, but the same
/// validation as [`Blob::append_escaped_arg`] and a `./` (or `.\`) prefix
/// when the name begins with `-`.
pub fn defuse_filename_arg(arg: &str, flavor: ShellFlavor) -> Cow<'_, str> {
    scan(arg.as_bytes(), flavor.table(), None);
    if arg.starts_with('-') {
        let prefix = String::from_utf8_lossy(flavor.dash_prefix());
        Cow::Owned(format!("{prefix}{arg}"))
    } else {
        Cow::Borrowed(arg)
    }
}

impl<'a> Blob<'a> {
    /// Append `arg` to a command line being built for the host shell.
    /// See [`append_escaped_arg_with`](Blob::append_escaped_arg_with).
    pub fn append_escaped_arg(&mut self, arg: &[u8], is_filename: bool) {
        self.append_escaped_arg_with(ShellFlavor::host(), arg, is_filename);
    }

    /// Append `arg` to a command line being built for `flavor`.
    ///
    /// A space is inserted first unless the blob is empty or already ends
    /// in whitespace. Arguments made only of safe bytes are appended as they
    /// are, and an empty argument becomes an empty quoted string.
    /// Otherwise POSIX arguments are wrapped in `'...'`, or backslash
    /// escaped when they contain `'` themselves; Windows arguments are
    /// wrapped in `"..."` with embedded `"` doubled.
    ///
    /// Fatal on control characters and malformed UTF-8. The first word of
    /// the blob names the command in the diagnostic.
    pub fn append_escaped_arg_with(&mut self, flavor: ShellFlavor, arg: &[u8], is_filename: bool) {
        let table = flavor.table();
        let command = self
            .as_bytes()
            .split(|&b| is_space(b))
            .find(|word| !word.is_empty())
            .map(|word| String::from_utf8_lossy(word).into_owned())
            .unwrap_or_default();
        let needs_quoting = scan(arg, table, Some(&command)) || arg.is_empty();

        self.mark_not_sql();
        if matches!(self.as_bytes().last(), Some(&last) if !is_space(last)) {
            self.append_char(b' ');
        }
        let prefix: &[u8] = if is_filename && arg.first() == Some(&b'-') {
            flavor.dash_prefix()
        } else {
            b""
        };

        if !needs_quoting {
            self.append(prefix);
            self.append(arg);
            return;
        }
        match flavor {
            ShellFlavor::Posix if arg.contains(&b'\'') => {
                self.append(prefix);
                for &b in arg {
                    if matches!(table[b as usize], QUOTE | LEAD_2 | LEAD_3 | LEAD_4) {
                        self.append_char(b'\\');
                    }
                    self.append_char(b);
                }
            }
            ShellFlavor::Posix => {
                self.append_char(b'\'');
                self.append(prefix);
                self.append(arg);
                self.append_char(b'\'');
            }
            ShellFlavor::Windows => {
                self.append_char(b'"');
                self.append(prefix);
                for &b in arg {
                    if b == b'"' {
                        self.append_char(b'"');
                    }
                    self.append_char(b);
                }
                self.append_char(b'"');
            }
        }
    }
}
