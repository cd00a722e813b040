// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request interception
//!
//! Hooks that rewrite outgoing request headers before they are sent.

mod interceptor;

pub use interceptor::{HeaderSink, InterceptorChain, RequestInterceptor, RequestLogger};
