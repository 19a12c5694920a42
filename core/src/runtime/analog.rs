//! Analog channels
//!
//! Each analog field keeps a fixed-point accumulator in device units.
//! Absolute devices report positions in `[ABSOLUTE_MIN, ABSOLUTE_MAX]`,
//! relative devices report motion in `RELATIVE_PER_STEP` units per output
//! step. The channel is committed once per frame (`on_frame_end`) and
//! converted to register bits lazily on every read.
//!
//! Scale factors are 8.24 fixed point:
//!
//! ```text
//! register = base + accum * scale / 2^24
//! accum    = register_delta * keyscale / 2^24,  keyscale = 2^48 / scale
//! ```

use crate::input::{InputDevices, SampleKind, SeqType, Sequence};
use crate::port::{AnalogParams, ControlClass, ControlType, PortField};

pub const ABSOLUTE_MIN: i32 = -0x10000;
pub const ABSOLUTE_MAX: i32 = 0x10000;
pub const RELATIVE_PER_STEP: i32 = 0x200;

/// Fields narrower than this get finer key steps
const MIN_ANALOG_BITS: u32 = 8;

const FIXED_ONE: i64 = 1 << 24;

fn compute_scale(numerator: i32, denominator: i32) -> i64 {
    (i64::from(numerator) << 24) / i64::from(denominator)
}

fn recip_scale(scale: i64) -> i64 {
    if scale == 0 { 0 } else { (1i64 << 48) / scale }
}

fn apply_scale(value: i32, scale: i64) -> i32 {
    let scaled = i128::from(value) * i128::from(scale) / i128::from(FIXED_ONE);
    scaled.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Runtime state of one analog field
#[derive(Debug, Clone)]
pub struct AnalogChannel {
    control: ControlType,
    player: u8,
    mask: u32,
    shift: u32,
    increment: Sequence,
    decrement: Sequence,

    // Register-unit parameters
    adjmin: i32,
    adjmax: i32,
    adjdef: i32,
    sensitivity: i32,
    delta: i32,
    center_delta: i32,

    // Device-unit range and scales
    minimum: i32,
    maximum: i32,
    scalepos: i64,
    scaleneg: i64,
    keyscalepos: i64,
    keyscaleneg: i64,
    reverse_val: i32,

    absolute: bool,
    autocenter: bool,
    single_scale: bool,
    pedal: bool,
    interpolate: bool,
    reverse: bool,
    reset: bool,
    wraps: bool,

    accum: i32,
    previous: i32,
    last_digital: bool,
    reset_this_frame: bool,
}

impl AnalogChannel {
    /// Build from a registry field; `None` unless the field is analog
    pub fn from_field(field: &PortField) -> Option<Self> {
        let class = field.class();
        if !class.is_analog() {
            return None;
        }
        let params = field.analog()?;
        let descriptor = field.descriptor();
        Some(Self::new(
            descriptor.control,
            descriptor.player,
            field.mask(),
            descriptor.default_value,
            params,
            field.sequence(SeqType::Increment).clone(),
            field.sequence(SeqType::Decrement).clone(),
        ))
    }

    pub fn new(
        control: ControlType,
        player: u8,
        mask: u32,
        default_value: u32,
        params: &AnalogParams,
        increment: Sequence,
        decrement: Sequence,
    ) -> Self {
        let shift = mask.trailing_zeros();
        let bits = mask.count_ones();
        // Registries cap analog fields at MAX_ANALOG_BITS; direct callers may not
        let field_max = i32::try_from(mask.checked_shr(shift).unwrap_or(0)).unwrap_or(i32::MAX);
        let to_field = |value: u32| i32::try_from(value).unwrap_or(i32::MAX);
        let adjmin = to_field(params.minimum).clamp(0, field_max);
        let adjmax = to_field(params.maximum).clamp(adjmin, field_max);
        let adjdef = to_field((default_value & mask).checked_shr(shift).unwrap_or(0))
            .clamp(adjmin, adjmax);

        let absolute = control.class() == ControlClass::AnalogAbsolute;
        let pedal = params.pedal.unwrap_or(control.is_pedal());
        let single_scale = absolute && !pedal && (adjdef == adjmin || adjdef == adjmax);

        let (minimum, maximum, scalepos, scaleneg, mut reverse_val) = if !absolute {
            let step = i64::from(RELATIVE_PER_STEP);
            let minimum = clamp_i32((i64::from(adjmin) - i64::from(adjdef)) * step);
            let maximum = clamp_i32((i64::from(adjmax) - i64::from(adjdef)) * step);
            let scale = compute_scale(1, RELATIVE_PER_STEP);
            (minimum, maximum, scale, scale, minimum.saturating_add(maximum))
        } else if pedal {
            let scale = compute_scale(adjmax - adjmin, ABSOLUTE_MAX);
            (ABSOLUTE_MIN, ABSOLUTE_MAX, scale, scale, ABSOLUTE_MAX)
        } else if single_scale {
            let scale = compute_scale(adjmax - adjmin, ABSOLUTE_MAX - ABSOLUTE_MIN);
            (ABSOLUTE_MIN, ABSOLUTE_MAX, scale, scale, ABSOLUTE_MAX)
        } else {
            (
                ABSOLUTE_MIN,
                ABSOLUTE_MAX,
                compute_scale(adjmax - adjdef, ABSOLUTE_MAX),
                compute_scale(adjdef - adjmin, -ABSOLUTE_MIN),
                0,
            )
        };
        if params.wraps && !absolute {
            // Reversal is negation modulo the full turn
            reverse_val = reverse_val.saturating_add(RELATIVE_PER_STEP);
        }

        let mut keyscalepos = recip_scale(scalepos);
        let mut keyscaleneg = recip_scale(scaleneg);
        if bits < MIN_ANALOG_BITS {
            keyscalepos >>= MIN_ANALOG_BITS - bits;
            keyscaleneg >>= MIN_ANALOG_BITS - bits;
        }

        Self {
            control,
            player,
            mask,
            shift,
            increment,
            decrement,
            adjmin,
            adjmax,
            adjdef,
            sensitivity: params.sensitivity.max(1),
            delta: params.delta,
            center_delta: params.center_delta,
            minimum,
            maximum,
            scalepos,
            scaleneg,
            keyscalepos,
            keyscaleneg,
            reverse_val,
            absolute,
            autocenter: absolute && control.autocenters(),
            single_scale,
            pedal,
            interpolate: params
                .interpolate
                .unwrap_or(!params.reset && !control.is_lightgun()),
            reverse: params.reverse,
            reset: params.reset,
            wraps: params.wraps,
            accum: 0,
            previous: 0,
            last_digital: false,
            reset_this_frame: false,
        }
    }

    pub fn control(&self) -> ControlType {
        self.control
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Accumulator in device units
    pub fn accumulator(&self) -> i32 {
        self.accum
    }

    /// Accumulator at the start of the current frame
    pub fn previous(&self) -> i32 {
        self.previous
    }

    /// Whether the last change came from increment/decrement keys
    pub fn last_change_was_digital(&self) -> bool {
        self.last_digital
    }

    fn apply_sensitivity(&self, value: i32) -> i32 {
        let scaled = i64::from(value) * i64::from(self.sensitivity);
        clamp_i32((scaled * 2 + 100).div_euclid(200))
    }

    fn apply_inverse_sensitivity(&self, value: i32) -> i32 {
        clamp_i32(i64::from(value) * 100 / i64::from(self.sensitivity))
    }

    /// Clamp a device-unit value to the channel's range
    pub fn clamp(&self, value: i32) -> i32 {
        let low = self.apply_inverse_sensitivity(self.minimum);
        let high = self.apply_inverse_sensitivity(self.maximum);
        value.clamp(low.min(high), high.max(low))
    }

    /// Commit this frame's device input into the accumulator
    pub fn on_frame_end<D: InputDevices + ?Sized>(&mut self, devices: &mut D) {
        if !self.wraps {
            self.accum = self.clamp(self.accum);
        }
        self.previous = self.accum;

        let sample = devices.poll(self.control, self.player);
        let mut delta = 0i32;
        if sample.kind == SampleKind::Relative && sample.value != 0 {
            delta = sample.value;
            self.last_digital = false;
        }

        let decrement = self.decrement.pressed(&*devices);
        let increment = self.increment.pressed(&*devices);
        let keyscale = if self.accum >= 0 {
            self.keyscalepos
        } else {
            self.keyscaleneg
        };
        let step = apply_scale(if self.delta == 0 { 1 } else { self.delta }, keyscale);
        // Pedals travel toward the negative end when pressed
        let sign = if self.pedal { -1 } else { 1 };
        if decrement {
            delta = delta.saturating_sub(step.saturating_mul(sign));
            self.last_digital = true;
        }
        if increment {
            delta = delta.saturating_add(step.saturating_mul(sign));
            self.last_digital = true;
        }

        self.reset_this_frame = false;
        if self.reset && !self.absolute {
            self.accum = 0;
            self.reset_this_frame = true;
        }
        self.accum = self.accum.saturating_add(delta);

        if sample.kind == SampleKind::Absolute && !(sample.value == 0 && self.last_digital) {
            self.accum = self.apply_inverse_sensitivity(sample.value);
            self.last_digital = false;
        }

        let keys_held = increment || decrement;
        if self.autocenter && self.last_digital && !keys_held {
            let center = apply_scale(self.center_delta, keyscale).max(0);
            if self.accum > 0 {
                self.accum -= center.min(self.accum);
            } else if self.accum < 0 {
                self.accum += center.min(self.accum.saturating_neg());
            }
            if self.accum == 0 {
                self.last_digital = false;
            }
        } else if !self.autocenter && !keys_held {
            self.last_digital = false;
        }
    }

    /// Register value in field units at `fraction` of the frame
    pub fn value(&self, fraction: f64) -> i32 {
        let mut value = self.accum;
        if self.interpolate && !self.reset_this_frame && self.accum != self.previous {
            let fixed = (fraction.clamp(0.0, 1.0) * 65536.0) as i64;
            let span = i64::from(self.accum) - i64::from(self.previous);
            value = clamp_i32(i64::from(self.previous) + span * fixed / 65536);
        }
        self.apply_settings(value)
    }

    /// Bits contributed to the group at `fraction` of the frame
    pub fn read(&self, fraction: f64) -> u32 {
        (self.value(fraction) as u32).checked_shl(self.shift).unwrap_or(0) & self.mask
    }

    fn apply_settings(&self, value: i32) -> i32 {
        let mut value = if self.wraps { value } else { self.clamp(value) };
        value = self.apply_sensitivity(value);

        if self.pedal {
            value = value.saturating_neg().max(0);
            if self.reverse {
                value = self.reverse_val.saturating_sub(value);
            }
        } else if self.reverse {
            value = self.reverse_val.saturating_sub(value);
        } else if self.single_scale {
            value = value.saturating_sub(ABSOLUTE_MIN);
        }

        let scale = if value >= 0 { self.scalepos } else { self.scaleneg };
        value = apply_scale(value, scale);

        let base = if self.single_scale || self.pedal {
            self.adjmin
        } else {
            self.adjdef
        };
        value = value.saturating_add(base);

        if self.wraps {
            let span = i64::from(self.adjmax) - i64::from(self.adjmin) + 1;
            let offset = (i64::from(value) - i64::from(self.adjmin)).rem_euclid(span);
            value = clamp_i32(i64::from(self.adjmin) + offset);
        }
        value
    }
}
