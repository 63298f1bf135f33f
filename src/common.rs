// Licensed under the Apache-2.0 license

/// Name and version of this library as built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProductInfo {
    pub product: &'static str,
    pub version: &'static str,
}

impl core::fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.product, self.version)
    }
}

#[must_use]
pub const fn product_info() -> ProductInfo {
    ProductInfo {
        product: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }
}

/// Blocking delay that sleeps the calling thread.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
