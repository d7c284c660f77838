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

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Root object, named by its type.
    Named,
    Class,
    ClassMember,
    Container,
    ContainerElement,
    Choice,
    ChoiceVariant,
    /// Object behind an "other" pointer, named by its real type.
    Pointer,
}

#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub kind: FrameKind,
    pub name: &'static str,
}

/// Nesting of the objects currently being written or read.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl FrameStack {
    pub fn new(max_depth: u32) -> Self {
        FrameStack {
            frames: Vec::new(),
            max_depth: max_depth as usize,
        }
    }

    pub fn push(&mut self, kind: FrameKind, name: &'static str) -> Result<(), Error> {
        if self.frames.len() >= self.max_depth {
            return Err(Error::depth_exceed(format!(
                "maximum depth {} exceeded at {}",
                self.max_depth,
                self.trace()
            )));
        }
        self.frames.push(Frame { kind, name });
        Ok(())
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Path of the current position, e.g. `Person.friends.E.name`.
    pub fn trace(&self) -> String {
        let mut path = String::new();
        for frame in &self.frames {
            let segment = match frame.kind {
                FrameKind::Named | FrameKind::ClassMember | FrameKind::ChoiceVariant => frame.name,
                FrameKind::ContainerElement => "E",
                FrameKind::Pointer => {
                    path.push_str(&format!("({})", frame.name));
                    continue;
                }
                FrameKind::Class | FrameKind::Container | FrameKind::Choice => continue,
            };
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
        }
        path
    }
}
