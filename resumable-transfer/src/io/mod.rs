/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod part_reader;
mod stream;

pub(crate) use part_reader::PartReader;
pub use stream::InputStream;
