pub mod dominant;
pub mod kmeans;

pub use dominant::{dominant_color, pixel_points, DominantColor};
pub use kmeans::{cluster_colors, ColorClusters, ColorPoint, KMeansParams};
