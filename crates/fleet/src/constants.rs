// Number of deposit round trips remembered per resource node.
pub const DEPOSIT_HISTORY_LENGTH: usize = 5;

// Inline capacity hint for unit bodies. Larger bodies spill to the heap.
pub const BODY_INLINE_CAPACITY: usize = 16;

// Development level at which a region harvests at its full configured ratio.
pub const FULL_DEVELOPMENT_LEVEL: u32 = 4;

// Units stay in the world this many ticks after being materialized.
pub const UNIT_LIFETIME_TICKS: u32 = 1500;

// Ticks a factory needs per capability segment.
pub const SPAWN_TICKS_PER_SEGMENT: u32 = 3;
