// Routable parameter - a local value plus a routing override
// The effective value is the override while the parameter is routed.
// Children never point back at the routing table; the engine pushes
// override values in at the top of each tick.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Routable<T: Copy> {
    local: T,
    override_value: T,
    routed: bool,
}

impl<T: Copy> Routable<T> {
    pub fn new(value: T) -> Self {
        Self {
            local: value,
            override_value: value,
            routed: false,
        }
    }

    /// Effective value: the override while routed, the local otherwise.
    pub fn get(&self) -> T {
        if self.routed {
            self.override_value
        } else {
            self.local
        }
    }

    /// The stored local value, ignoring any routing.
    pub fn local(&self) -> T {
        self.local
    }

    pub fn set(&mut self, value: T) {
        self.local = value;
    }

    pub fn set_routed(&mut self, value: T) {
        self.override_value = value;
        self.routed = true;
    }

    pub fn clear_route(&mut self) {
        self.routed = false;
    }

    pub fn is_routed(&self) -> bool {
        self.routed
    }
}
