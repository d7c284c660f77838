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

/// What installing a hook does when the key already carries one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HookPolicy {
    /// Installing over an existing hook fails with [`crate::Error::HookConflict`].
    /// The existing hook must be reset first.
    #[default]
    Reject,
    /// Installing over an existing hook replaces it.
    Replace,
}

/// Configuration shared by an object stream and its format backend.
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether shared objects are written once and referenced afterwards.
    /// When disabled, every encounter of a shared object is written in full.
    pub track_refs: bool,
    /// Behavior of `set_*_hook` on an occupied key.
    pub hook_policy: HookPolicy,
    /// Maximum nesting depth of the frame stack.
    pub max_depth: u32,
    /// Whether the type label found before a root object must match the
    /// expected type.
    pub verify_type_name: bool,
    /// Indentation width used by the text backends.
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            track_refs: true,
            hook_policy: HookPolicy::Reject,
            max_depth: 512,
            verify_type_name: true,
            indent: 2,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_track_refs(&self) -> bool {
        self.track_refs
    }

    #[inline(always)]
    pub fn hook_policy(&self) -> HookPolicy {
        self.hook_policy
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline(always)]
    pub fn is_verify_type_name(&self) -> bool {
        self.verify_type_name
    }

    #[inline(always)]
    pub fn indent(&self) -> usize {
        self.indent
    }
}
