/// Default barcode width in pixels (one column per sampled frame group).
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1280;

/// Default barcode height in pixels.
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 480;

/// Channel value below which a border pixel counts as dark.
pub const BORDER_DARKNESS_THRESHOLD: u8 = 10;

/// Number of k-means clusters used to find the dominant color.
pub const DEFAULT_KMEANS_CLUSTERS: usize = 5;

/// Iteration cap for a single k-means attempt.
pub const DEFAULT_KMEANS_MAX_ITERATIONS: usize = 200;

/// Center movement (in channel units) below which k-means is considered converged.
pub const DEFAULT_KMEANS_EPSILON: f32 = 0.1;

/// Number of independently initialized k-means attempts; the most compact wins.
pub const DEFAULT_KMEANS_ATTEMPTS: usize = 10;

/// Base seed for k-means center initialization. Attempt `i` uses `seed + i`.
pub const DEFAULT_KMEANS_SEED: u64 = 0;

/// Number of decoded frames the ffmpeg reader thread may buffer ahead.
pub const FFMPEG_PREFETCH_FRAMES: usize = 8;

/// Number of color channels in a decoded frame (B, G, R).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Minimum amount of work (points × attempts) to spread k-means attempts over Rayon.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;
