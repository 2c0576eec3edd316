//! Persistence eligibility.
//!
//! A fresh response is stored only when the request is a cacheable `GET` and
//! the response is a plain `200` from the application's own origin.

use precache_core::{CacheConfig, Request, Response, ResponseType};

/// Classification of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// May be persisted.
    Cacheable,
    /// Under an excluded prefix; always served fresh, never stored.
    Excluded,
}

pub fn classify(config: &CacheConfig, request: &Request) -> RequestClass {
    if config.is_excluded(&request.url) { RequestClass::Excluded } else { RequestClass::Cacheable }
}

/// Why a response was or was not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotGet,
    Excluded,
    Status(u16),
    NotBasic(ResponseType),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decide whether `response` to `request` may be written to the current store.
pub fn eligibility(config: &CacheConfig, request: &Request, response: &Response) -> Eligibility {
    if !request.is_get() {
        return Eligibility::NotGet;
    }
    if classify(config, request) == RequestClass::Excluded {
        return Eligibility::Excluded;
    }
    if response.status != 200 {
        return Eligibility::Status(response.status);
    }
    if response.response_type != ResponseType::Basic {
        return Eligibility::NotBasic(response.response_type);
    }
    Eligibility::Eligible
}
