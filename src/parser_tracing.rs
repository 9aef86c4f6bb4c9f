use std::fmt::Write;

const TRACE_IDENT_PLACEHOLDER: &str = "\t";

/// Receives a `trace`/`untrace` pair around every traced parse function.
pub trait Tracer {
    fn trace(&mut self, msg: &str);

    fn untrace(&mut self, msg: &str);
}

impl<T: Tracer + ?Sized> Tracer for &mut T {
    fn trace(&mut self, msg: &str) {
        (**self).trace(msg)
    }

    fn untrace(&mut self, msg: &str) {
        (**self).untrace(msg)
    }
}

/// Default tracer; discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&mut self, _msg: &str) {}

    fn untrace(&mut self, _msg: &str) {}
}

/// Records `BEGIN`/`END` lines, indented with one tab per nesting level.
#[derive(Debug, Default, Clone)]
pub struct IndentTracer {
    level: usize,
    out: String,
}

impl IndentTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    fn ident_level(&self) -> String {
        TRACE_IDENT_PLACEHOLDER.repeat(self.level.saturating_sub(1))
    }

    fn trace_print(&mut self, fs: &str) {
        let indent = self.ident_level();
        // writing into a String cannot fail
        let _ = writeln!(self.out, "{}{}", indent, fs);
    }
}

impl Tracer for IndentTracer {
    fn trace(&mut self, msg: &str) {
        self.level += 1;
        self.trace_print(&format!("BEGIN {}", msg));
    }

    fn untrace(&mut self, msg: &str) {
        self.trace_print(&format!("END {}", msg));
        self.level = self.level.saturating_sub(1);
    }
}

/// Forwards parse tracing to the `tracing` facade at TRACE level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer {
    depth: usize,
}

impl Tracer for LogTracer {
    fn trace(&mut self, msg: &str) {
        self.depth += 1;
        tracing::trace!(depth = self.depth, "BEGIN {}", msg);
    }

    fn untrace(&mut self, msg: &str) {
        tracing::trace!(depth = self.depth, "END {}", msg);
        self.depth = self.depth.saturating_sub(1);
    }
}
