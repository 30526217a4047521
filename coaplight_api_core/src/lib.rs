// SPDX-FileCopyrightText: © 2023 TUM
// SPDX-License-Identifier: MIT
#![no_std]

extern crate alloc;

pub mod attribute_scanner;
pub mod coap_mapping;
pub mod common;
pub mod identity;
pub mod json_token;
pub mod light;
pub mod resource;
