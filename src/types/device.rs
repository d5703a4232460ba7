//! Device and node information types.

/// Numeric id of a node in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Broadcast address.
    pub const BROADCAST: Self = Self(0xFFFF_FFFF);

    /// Creates a node id from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true if this is the broadcast address.
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{:08x}", self.0)
    }
}

/// Geographic position reported by a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Altitude in meters above sea level.
    pub altitude: i32,
    /// Fix timestamp (Unix seconds).
    pub time: u32,
}

/// User record attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    /// Globally unique user id.
    pub id: String,
    /// Full display name.
    pub long_name: String,
    /// Short name shown on small screens (up to 4 characters).
    pub short_name: String,
    /// Hardware model identifier.
    pub hw_model: u8,
}

/// Information about one node in the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    /// Node id.
    pub num: NodeId,
    /// User record, if the node has broadcast one.
    pub user: Option<User>,
    /// Last known position.
    pub position: Option<Position>,
    /// Signal-to-noise ratio of the last received packet, in dB.
    pub snr: f32,
    /// When the node was last heard (Unix seconds).
    pub last_heard: u32,
}

/// Information about the connected device itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MyNodeInfo {
    /// Node id of the connected device.
    pub my_node_num: NodeId,
    /// Reboot counter.
    pub reboot_count: u32,
    /// Minimum app firmware version the device accepts.
    pub min_app_version: u32,
}

/// Telemetry reading from a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    /// Battery charge in percent, 0-100.
    pub battery_level: u8,
    /// Battery voltage in volts.
    pub voltage: f32,
    /// Channel utilization in percent.
    pub channel_utilization: f32,
    /// Airtime used for transmit in percent.
    pub air_util_tx: f32,
    /// Reading timestamp (Unix seconds).
    pub time: u32,
}

/// Static metadata reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceMetadata {
    /// Firmware version string.
    pub firmware_version: String,
    /// Hardware model identifier.
    pub hw_model: u8,
    /// True if the device has a Bluetooth radio.
    pub has_bluetooth: bool,
    /// True if the device has a WiFi radio.
    pub has_wifi: bool,
}

/// State of the device-side outbound packet queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStatus {
    /// Free slots in the queue.
    pub free: u8,
    /// Total queue capacity.
    pub maxlen: u8,
    /// Id of the packet this status refers to, if any.
    pub mesh_packet_id: u32,
}

/// Role a channel plays in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ChannelRole {
    /// Channel slot is unused.
    #[default]
    Disabled = 0,
    /// The primary channel.
    Primary = 1,
    /// A secondary channel.
    Secondary = 2,
}

impl ChannelRole {
    /// Parses a channel role from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Primary,
            2 => Self::Secondary,
            _ => Self::Disabled,
        }
    }
}

/// Settings of one channel slot on the device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    /// Channel slot index.
    pub index: u8,
    /// Channel name.
    pub name: String,
    /// Role of this slot.
    pub role: ChannelRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(0xDEAD_BEEF).to_string(), "!deadbeef");
    }

    #[test]
    fn test_broadcast_id() {
        assert!(NodeId::BROADCAST.is_broadcast());
        assert!(!NodeId::new(1).is_broadcast());
    }

    #[test]
    fn test_channel_role_from_byte() {
        assert_eq!(ChannelRole::from_byte(1), ChannelRole::Primary);
        assert_eq!(ChannelRole::from_byte(2), ChannelRole::Secondary);
        assert_eq!(ChannelRole::from_byte(0xFF), ChannelRole::Disabled);
    }
}
