// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Object streams: the engine walking object graphs through a format
//! backend.
//!
//! An [`ObjectOStream`] writes root objects one after another; an
//! [`ObjectIStream`] reads them back in the same order. Both keep an
//! identity table per root object so that shared objects are written once
//! and referenced afterwards, and both accept hooks overriding the walk for
//! a type, a class member or a choice variant.

mod copier;
mod istream;
mod ostream;

pub use copier::ObjectStreamCopier;
pub use istream::ObjectIStream;
pub use ostream::ObjectOStream;
