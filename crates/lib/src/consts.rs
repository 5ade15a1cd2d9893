//! Well-known names shared across the crate.

/// Default location of the content-addressed store.
pub const DEFAULT_STORE_DIR: &str = "/nix/store";

/// Environment variable overriding the store root.
pub const STORE_DIR_ENV: &str = "BUILDMETA_STORE_DIR";

/// Presence-only marker: the build ran but reported failure.
pub const FAILED_MARKER: &str = "nix-support/failed";

/// Line-oriented list of declared build products.
pub const BUILD_PRODUCTS_FILE: &str = "nix-support/hydra-build-products";

/// Single-line release name.
pub const RELEASE_NAME_FILE: &str = "nix-support/hydra-release-name";

/// Line-oriented `name value [unit]` metrics.
pub const METRICS_FILE: &str = "nix-support/hydra-metrics";

/// Product type synthesized for outputs when no products were declared.
pub const FALLBACK_PRODUCT_TYPE: &str = "nix-build";

/// Length of the hash part of a store path base name.
pub const STORE_HASH_LEN: usize = 32;

/// Characters that may appear in the hash part of a store path.
pub const STORE_HASH_ALPHABET: &[u8] = b"0123456789abcdfghijklmnpqrsvwxyz";
