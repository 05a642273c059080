//! ANSI escape stripping for PTY output.
//!
//! The device console runs behind a PTY and may colorize banners or move
//! the cursor; none of that is command output. Chunks pass through a vte
//! parser that keeps printable text and line-structure control characters
//! and discards every escape sequence.

use vte::{Parser, Perform};

/// Strip ANSI escape sequences from `data`, keeping printable characters
/// plus CR, LF and TAB.
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    let mut parser = Parser::new();
    let mut plain = Plain {
        out: Vec::with_capacity(data.len()),
    };
    parser.advance(&mut plain, data);
    plain.out
}

/// Collector that keeps only printed characters and line structure.
struct Plain {
    out: Vec<u8>,
}

impl Perform for Plain {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\r' | b'\n' | b'\t') {
            self.out.push(byte);
        }
    }

    fn hook(&mut self, _params: &vte::Params, _intermediates: &[u8], _ignore: bool, _action: char) {}
    fn put(&mut self, _byte: u8) {}
    fn unhook(&mut self) {}
    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}
    fn csi_dispatch(
        &mut self,
        _params: &vte::Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
    }
    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}
