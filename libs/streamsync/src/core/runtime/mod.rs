// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

mod command_receiver;
mod commands;
mod handle;

pub use command_receiver::CommandReceiver;
pub use commands::EngineCommand;
pub use handle::EngineHandle;
