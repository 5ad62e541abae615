//! Parameter definitions for graph nodes.
//!
//! Parameters are the values the device layer writes from dials, switches
//! and sliders. The engine never trusts those writes: every value passes
//! through [`ParameterDefinition::clamp`] before it is published.

/// How a parameter value should be displayed and interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterDisplay {
    /// Linear scaling with a unit suffix (e.g., "Hz", "ms", "%").
    Linear { unit: &'static str },
    /// Logarithmic scaling, common for frequency and time controls.
    Logarithmic { unit: &'static str },
    /// Discrete steps with named values. Stored as the step index.
    Discrete { labels: &'static [&'static str] },
    /// On/off switch. Stored as 0.0 or 1.0.
    Toggle,
}

impl ParameterDisplay {
    /// Returns the unit string, if applicable.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Linear { unit } | Self::Logarithmic { unit } => Some(unit),
            _ => None,
        }
    }

    /// Returns true if this is a logarithmic parameter.
    pub fn is_logarithmic(&self) -> bool {
        matches!(self, Self::Logarithmic { .. })
    }
}

/// A value written by the device layer.
///
/// Dials send floats, switches send bools, sliders over enumerations send
/// an index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    Index(usize),
}

impl ParamValue {
    /// The raw numeric form, before clamping.
    pub fn as_f32(&self) -> f32 {
        match *self {
            ParamValue::Float(v) => v,
            ParamValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            ParamValue::Index(i) => i as f32,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Index(value)
    }
}

/// Definition of a parameter on a node kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterDefinition {
    /// Unique identifier within the node kind; also the persisted name.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Minimum value of the parameter.
    pub min: f32,
    /// Maximum value of the parameter.
    pub max: f32,
    /// Value a new node starts with.
    pub default: f32,
    /// How to display and interpret the parameter value.
    pub display: ParameterDisplay,
}

impl ParameterDefinition {
    /// Creates a linear parameter over `min..=max`.
    pub const fn new(
        id: &'static str,
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        unit: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            min,
            max,
            default,
            display: ParameterDisplay::Linear { unit },
        }
    }

    /// Creates a normalized parameter (0.0 to 1.0).
    pub const fn normalized(id: &'static str, name: &'static str, default: f32) -> Self {
        Self::new(id, name, 0.0, 1.0, default, "%")
    }

    /// Creates a parameter with logarithmic display.
    pub const fn logarithmic(
        id: &'static str,
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        unit: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            min,
            max,
            default,
            display: ParameterDisplay::Logarithmic { unit },
        }
    }

    /// Creates a toggle (boolean) parameter.
    pub const fn toggle(id: &'static str, name: &'static str, default: bool) -> Self {
        Self {
            id,
            name,
            min: 0.0,
            max: 1.0,
            default: if default { 1.0 } else { 0.0 },
            display: ParameterDisplay::Toggle,
        }
    }

    /// Creates a discrete choice parameter.
    pub const fn choice(
        id: &'static str,
        name: &'static str,
        labels: &'static [&'static str],
        default_index: usize,
    ) -> Self {
        Self {
            id,
            name,
            min: 0.0,
            max: labels.len().saturating_sub(1) as f32,
            default: default_index as f32,
            display: ParameterDisplay::Discrete { labels },
        }
    }

    /// Forces a value into this parameter's domain.
    ///
    /// Continuous values clamp to the range, choices round to the nearest
    /// valid index, toggles snap at 0.5. Non-finite input falls back to the
    /// default.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        match self.display {
            ParameterDisplay::Toggle => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ParameterDisplay::Discrete { .. } => value.round().clamp(self.min, self.max),
            _ => value.clamp(self.min, self.max),
        }
    }

    /// Normalizes a value from the parameter's range to 0.0-1.0.
    pub fn normalize(&self, value: f32) -> f32 {
        if (self.max - self.min).abs() < f32::EPSILON {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    /// Maps a 0.0-1.0 dial position onto the parameter's range.
    ///
    /// Logarithmic parameters with a positive range are mapped
    /// exponentially so equal dial travel is an equal ratio.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let t = normalized.clamp(0.0, 1.0);
        if self.display.is_logarithmic() && self.min > 0.0 {
            self.min * (self.max / self.min).powf(t)
        } else {
            self.min + t * (self.max - self.min)
        }
    }
}

/// Finds the index of the parameter named `id` in a definition table.
pub fn index_of(params: &[ParameterDefinition], id: &str) -> Option<usize> {
    params.iter().position(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_display_units() {
        let linear = ParameterDefinition::new("gain", "Gain", 0.0, 2.0, 1.0, "x");
        assert_eq!(linear.display.unit(), Some("x"));
        assert!(!linear.display.is_logarithmic());

        let log = ParameterDefinition::logarithmic("freq", "Freq", 20.0, 20000.0, 440.0, "Hz");
        assert!(log.display.is_logarithmic());

        let toggle = ParameterDefinition::toggle("run", "Run", true);
        assert_eq!(toggle.display.unit(), None);
    }

    #[test]
    fn test_parameter_clamp() {
        let param = ParameterDefinition::new("test", "Test", 0.0, 100.0, 50.0, "");
        assert_eq!(param.clamp(-10.0), 0.0);
        assert_eq!(param.clamp(50.0), 50.0);
        assert_eq!(param.clamp(150.0), 100.0);
    }

    #[test]
    fn test_non_finite_falls_back_to_default() {
        let param = ParameterDefinition::normalized("mix", "Mix", 0.3);
        assert_eq!(param.clamp(f32::NAN), 0.3);
        assert_eq!(param.clamp(f32::INFINITY), 0.3);
    }

    #[test]
    fn test_choice_clamp_rounds_to_index() {
        let param = ParameterDefinition::choice("mode", "Mode", &["A", "B", "C", "D"], 1);
        assert_eq!(param.min, 0.0);
        assert_eq!(param.max, 3.0);
        assert_eq!(param.default, 1.0);

        assert_eq!(param.clamp(1.4), 1.0);
        assert_eq!(param.clamp(1.6), 2.0);
        assert_eq!(param.clamp(9.0), 3.0);
        assert_eq!(param.clamp(-2.0), 0.0);
    }

    #[test]
    fn test_toggle_clamp_snaps() {
        let param = ParameterDefinition::toggle("run", "Run", false);
        assert_eq!(param.default, 0.0);
        assert_eq!(param.clamp(0.49), 0.0);
        assert_eq!(param.clamp(0.5), 1.0);
        assert_eq!(param.clamp(7.0), 1.0);
    }

    #[test]
    fn test_normalize_denormalize_linear() {
        let param = ParameterDefinition::new("bpm", "BPM", 20.0, 300.0, 120.0, "BPM");
        assert_eq!(param.denormalize(0.0), 20.0);
        assert_eq!(param.denormalize(1.0), 300.0);
        let n = param.normalize(120.0);
        assert!((param.denormalize(n) - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_denormalize_logarithmic() {
        let param = ParameterDefinition::logarithmic("freq", "Freq", 20.0, 20000.0, 440.0, "Hz");
        assert!((param.denormalize(0.0) - 20.0).abs() < 1e-3);
        assert!((param.denormalize(1.0) - 20000.0).abs() < 0.5);
        // Halfway is the geometric mean
        assert!((param.denormalize(0.5) - 632.45).abs() < 0.5);
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::from(0.25).as_f32(), 0.25);
        assert_eq!(ParamValue::from(true).as_f32(), 1.0);
        assert_eq!(ParamValue::from(false).as_f32(), 0.0);
        assert_eq!(ParamValue::from(3usize).as_f32(), 3.0);
    }

    #[test]
    fn test_index_of() {
        static PARAMS: [ParameterDefinition; 2] = [
            ParameterDefinition::normalized("a", "A", 0.0),
            ParameterDefinition::toggle("b", "B", true),
        ];
        assert_eq!(index_of(&PARAMS, "b"), Some(1));
        assert_eq!(index_of(&PARAMS, "c"), None);
    }
}
