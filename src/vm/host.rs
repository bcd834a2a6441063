//! The VM's I/O boundary: standard streams and URL fetching, behind a
//! trait so tests can swap in a recording/fake host instead of touching
//! real stdio or the network.

use std::io::{self, BufRead};

/// `say`/`ask`/`see_url` go through here rather than calling
/// `std::io`/a networking crate directly.
pub trait Host {
    fn write_line(&mut self, line: &str);
    fn read_line(&mut self) -> anyhow::Result<String>;
    fn fetch_url(&self, url: &str) -> anyhow::Result<String>;
}

/// The default host: real stdout/stdin, and a URL fetcher that always
/// fails (spec.md keeps the HTTP transport implementation out of scope;
/// a host embedding Aura supplies a real fetcher).
#[derive(Default)]
pub struct StdHost;

impl Host for StdHost {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        let mut buf = String::new();
        io::stdin().lock().read_line(&mut buf)?;
        Ok(buf.trim_end_matches(['\n', '\r']).to_string())
    }

    fn fetch_url(&self, url: &str) -> anyhow::Result<String> {
        let _ = url;
        anyhow::bail!("no URL fetcher configured")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Host;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records everything written, feeds back canned input lines, and
    /// serves canned URL responses keyed by exact URL.
    #[derive(Default)]
    pub struct RecordingHost {
        pub written: RefCell<Vec<String>>,
        pub input: RefCell<VecDeque<String>>,
        pub urls: std::collections::HashMap<String, String>,
    }

    impl Host for RecordingHost {
        fn write_line(&mut self, line: &str) {
            self.written.get_mut().push(line.to_string());
        }

        fn read_line(&mut self) -> anyhow::Result<String> {
            self.input.get_mut().pop_front().ok_or_else(|| anyhow::anyhow!("no more input"))
        }

        fn fetch_url(&self, url: &str) -> anyhow::Result<String> {
            self.urls.get(url).cloned().ok_or_else(|| anyhow::anyhow!("no such URL primed: {url}"))
        }
    }
}
