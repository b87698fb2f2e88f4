//! On-demand stack growth for recursion that follows input nesting.
//!
//! Event trees have no depth bound. Every recursive step over them (parse,
//! validate, serialize) goes through [`guarded`], which switches to a fresh
//! heap-allocated segment whenever less than [`RED_ZONE`] bytes of stack
//! remain. Depth is then limited by memory only.

/// Remaining stack below which a new segment is allocated.
pub const RED_ZONE: usize = 256 * 1024;

/// Size of each newly allocated segment.
pub const SEGMENT: usize = 8 * 1024 * 1024;

/// Run `f`, first moving to a new stack segment if the current one is low.
#[inline]
pub fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            guarded(|| 1 + depth(n - 1))
        }
    }

    #[test]
    fn recursion_outgrows_the_thread_stack() {
        // Far beyond what a 2 MiB test thread holds without growth.
        assert_eq!(depth(200_000), 200_000);
    }
}
