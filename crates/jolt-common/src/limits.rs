//! Centralized limits and thresholds for the Jolt compiler.
//!
//! Shared constants for iteration counts and recursion depths used across
//! the workspace, so each limit is defined exactly once.

/// Maximum iterations of the type engine's specialization fixed point.
///
/// Each iteration re-walks every call site and may create new function
/// specializations or refine inferred return types. Real programs converge
/// in two or three iterations; the engine contract requires at least 8.
/// Hitting this bound is reported as an internal inference error.
pub const MAX_INFER_ITERATIONS: u32 = 16;

/// Maximum specializations minted for one function.
///
/// A self-call with a growing argument type (`w([x])` inside `w`) would
/// otherwise mint a new specialization per nesting level and never
/// converge. Past this cap the engine reports the function and stops
/// specializing it.
pub const MAX_FUNCTION_SPECIALIZATIONS: usize = 64;

/// Maximum alias chain length followed by `resolve_alias`.
///
/// Alias cycles are rejected at registration, so this is a backstop for
/// registry corruption rather than a user-visible limit.
pub const MAX_ALIAS_DEPTH: u32 = 64;

/// Maximum parser recursion depth.
///
/// Deeply nested expressions (`((((((1))))))`) add one frame per level;
/// past this depth the parser emits an unexpected-token diagnostic and
/// unwinds instead of overflowing the stack.
pub const MAX_PARSE_DEPTH: u32 = 500;

/// Linear scan window around a binary-search hit in the code index.
///
/// Index entries are sorted by start position, but ranges can overlap
/// (e.g. a member access inside a call); scanning a few neighbors on both
/// sides keeps `find_at_position` at O(log n + k) with k <= 11.
pub const INDEX_LOOKUP_WINDOW: usize = 5;
