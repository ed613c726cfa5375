//! Constants used in the integration tests

/// The names of the bridged chains, in chain order
pub(crate) const CHAIN_NAMES: [&str; 3] = ["athena", "hermes", "demeter"];

/// The domain the remote testnet endpoints live under when none is configured
pub(crate) const DEFAULT_DOMAIN: &str = "localhost";

/// The name and symbol of the webb token deployed by the tests
pub(crate) const TEST_WEBB_TOKEN: &str = "webbWETH";

/// A compressed DKG public key used as the bridge governor
pub(crate) const TEST_GOVERNOR: &str =
    "0x0277c66266b89414906b425c1d1089a448f506299444de64ea86c385ac2b78ff6e";

/// The nonce of the ownership transfer to the test governor
pub(crate) const TEST_GOVERNOR_NONCE: u32 = 1;
