// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the worker engine

use harrow_core::ParamsError;
use harrow_store::StoreError;
use thiserror::Error;

/// Errors that can occur while selecting, claiming, or recording jobs
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid job parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("work directory error: {0}")]
    Workdir(#[source] std::io::Error),
}
