// Routing table - maps modulation sources to controllable parameters.
// The engine evaluates routes once per tick and pushes override values
// into the targeted Routable parameters.

use crate::config::{CV_INPUT_COUNT, ROUTE_COUNT, TRACK_COUNT};
use crate::model::types::MidiPort;
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// Parameter a route can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RoutingTarget {
    #[default]
    None = 0,
    Tempo = 1,
    Swing = 2,
    Mute = 3,
    Fill = 4,
    FillAmount = 5,
    SlideTime = 6,
    Octave = 7,
    Transpose = 8,
    Rotate = 9,
    Divisor = 10,
    RunMode = 11,
    FirstStep = 12,
    LastStep = 13,
    CurveMin = 14,
    CurveMax = 15,
    CurveOffset = 16,
}

impl RoutingTarget {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Tempo,
            2 => Self::Swing,
            3 => Self::Mute,
            4 => Self::Fill,
            5 => Self::FillAmount,
            6 => Self::SlideTime,
            7 => Self::Octave,
            8 => Self::Transpose,
            9 => Self::Rotate,
            10 => Self::Divisor,
            11 => Self::RunMode,
            12 => Self::FirstStep,
            13 => Self::LastStep,
            14 => Self::CurveMin,
            15 => Self::CurveMax,
            16 => Self::CurveOffset,
            _ => Self::None,
        }
    }

    /// Whether the target lives on a track rather than the project.
    pub fn is_track_target(&self) -> bool {
        !matches!(
            self,
            Self::None | Self::Tempo | Self::Swing | Self::Fill | Self::FillAmount
        )
    }
}

/// Where a route reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RoutingSource {
    #[default]
    None,
    /// CV input channel, normalized from +-5 V.
    CvIn(u8),
    /// Latched MIDI continuous controller value.
    MidiCc {
        port: MidiPort,
        channel: u8,
        controller: u8,
    },
    /// Another track's CV output.
    TrackCv(u8),
}

impl RoutingSource {
    fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::CvIn(_) => 1,
            Self::MidiCc { .. } => 2,
            Self::TrackCv(_) => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub target: RoutingTarget,
    /// Bitmask of tracks a track-target applies to.
    pub tracks: u8,
    pub min: f32,
    pub max: f32,
    pub source: RoutingSource,
}

impl Route {
    pub fn new() -> Self {
        Self {
            target: RoutingTarget::None,
            tracks: 0,
            min: 0.0,
            max: 1.0,
            source: RoutingSource::None,
        }
    }

    pub fn active(&self) -> bool {
        self.target != RoutingTarget::None && self.source != RoutingSource::None
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u8(self.target as u8)?;
        writer.write_u8(self.tracks)?;
        writer.write_f32(self.min)?;
        writer.write_f32(self.max)?;
        writer.write_u8(self.source.tag())?;
        match self.source {
            RoutingSource::None => {
                writer.write_u8(0)?;
                writer.write_u8(0)?;
                writer.write_u8(0)?;
            }
            RoutingSource::CvIn(channel) => {
                writer.write_u8(channel)?;
                writer.write_u8(0)?;
                writer.write_u8(0)?;
            }
            RoutingSource::MidiCc {
                port,
                channel,
                controller,
            } => {
                writer.write_u8(port as u8)?;
                writer.write_u8(channel)?;
                writer.write_u8(controller)?;
            }
            RoutingSource::TrackCv(track) => {
                writer.write_u8(track)?;
                writer.write_u8(0)?;
                writer.write_u8(0)?;
            }
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.target = RoutingTarget::from_u8(reader.read_u8()?);
        self.tracks = reader.read_u8()?;
        self.min = reader.read_f32()?;
        self.max = reader.read_f32()?;
        let tag = reader.read_u8()?;
        let a = reader.read_u8()?;
        let b = reader.read_u8()?;
        let c = reader.read_u8()?;
        self.source = match tag {
            1 => RoutingSource::CvIn(a.min(CV_INPUT_COUNT as u8 - 1)),
            2 => RoutingSource::MidiCc {
                port: MidiPort::from_u8(a),
                channel: b.min(16),
                controller: c & 0x7f,
            },
            3 => RoutingSource::TrackCv(a.min(TRACK_COUNT as u8 - 1)),
            _ => RoutingSource::None,
        };
        Ok(())
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Routing {
    routes: [Route; ROUTE_COUNT],
}

impl Routing {
    pub fn new() -> Self {
        Self {
            routes: [Route::new(); ROUTE_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.routes = [Route::new(); ROUTE_COUNT];
    }

    pub fn routes(&self) -> &[Route; ROUTE_COUNT] {
        &self.routes
    }

    pub fn route(&self, index: usize) -> &Route {
        &self.routes[index.min(ROUTE_COUNT - 1)]
    }

    pub fn route_mut(&mut self, index: usize) -> &mut Route {
        &mut self.routes[index.min(ROUTE_COUNT - 1)]
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        for route in &self.routes {
            route.write(writer)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        for route in self.routes.iter_mut() {
            route.read(reader)?;
        }
        Ok(())
    }
}
