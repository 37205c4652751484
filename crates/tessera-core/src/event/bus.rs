// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// An unbounded multi-producer channel carrying events of type `T`.
///
/// The bus keeps one receiver for itself; subscribers get clones of it, so every
/// event is delivered to exactly one of them. With a single subscriber (the usual
/// case for texture notifications) that subscriber sees every event in order.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a new bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends an event, logging an error if every receiver has been dropped.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing an event.");
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sending end, for producers outside the owner.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Returns a new handle to the receiving end.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
