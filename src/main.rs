/*
Copyright 2021 Jakub Lewandowski

This file is part of MONET Geospatial Accessors (monet-rs).

MONET Geospatial Accessors (monet-rs) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

MONET Geospatial Accessors (monet-rs) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with MONET Geospatial Accessors (monet-rs). If not, see https://www.gnu.org/licenses/.
*/

//! MONET Geospatial Accessors (monet-rs) pair atmospheric model output
//! with point observations.
//!
//! The command-line tool reads `config.yaml` from the working directory,
//! pairs the observations with a model grid or with target points and
//! writes paired data, optional `ascii2nc` observations and figures
//! to the output directory.

mod app;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::alloc;

/// Global allocator used by the tool.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`app::main`].
///
/// The `env_logger` is initiated before any log message can occur,
/// so that errors of the whole run, shutdown included, are reported.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("MONET_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("MONET_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match app::main() {
        Ok(_) => info!("Pairing finished. Check the output directory and log."),
        Err(err) => error!("Pairing failed with error: {}", err),
    }
}
