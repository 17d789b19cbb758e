//! Recognize a browser starting the binary as a native-messaging host.
//!
//! Browsers never pass a subcommand. Chrome runs `pageguard
//! chrome-extension://<id>/`, adding `--parent-window=<handle>` on Windows.
//! Firefox runs `pageguard <manifest.json> <extension-id>`. Both are
//! rewritten to `pageguard host` before clap sees them.

use std::ffi::{OsStr, OsString};

const CHROME_ORIGIN_PREFIX: &str = "chrome-extension://";
const PARENT_WINDOW_FLAG: &str = "--parent-window=";

fn is_chrome_arg(arg: &OsStr) -> bool {
    arg.to_str().is_some_and(|a| {
        a.starts_with(CHROME_ORIGIN_PREFIX) || a.starts_with(PARENT_WINDOW_FLAG)
    })
}

fn is_chrome_launch(args: &[OsString]) -> bool {
    args.iter()
        .any(|a| a.to_str().is_some_and(|a| a.starts_with(CHROME_ORIGIN_PREFIX)))
        && args.iter().all(|a| is_chrome_arg(a))
}

fn is_firefox_launch(args: &[OsString]) -> bool {
    match args {
        [manifest, extension_id] => {
            let manifest = manifest.to_string_lossy().to_ascii_lowercase();
            let extension_id = extension_id.to_string_lossy();
            manifest.ends_with(".json")
                && !extension_id.is_empty()
                && !extension_id.starts_with('-')
        }
        _ => false,
    }
}

/// Whether the arguments after the program name come from a browser.
pub fn is_browser_launch(args: &[OsString]) -> bool {
    is_chrome_launch(args) || is_firefox_launch(args)
}

/// Rewrite a browser launch, or a bare invocation with piped stdin, into
/// `pageguard host`. Anything else passes through unchanged.
pub fn normalize_args<I>(args: I, stdin_is_terminal: bool) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    if args.is_empty() {
        return args;
    }
    let rest = &args[1..];
    if is_browser_launch(rest) || (rest.is_empty() && !stdin_is_terminal) {
        args.truncate(1);
        args.push(OsString::from("host"));
    }
    args
}
