//! Per-skin face configuration

/// Look of one watch face variant, shared immutably between engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSkin {
    pub name: String,
    pub twelve_hour: bool,
    /// Show the sweeping seconds progress in interactive mode
    pub seconds_arc: bool,
    pub step_label: String,
}

impl FaceSkin {
    pub fn builder(name: impl Into<String>) -> FaceSkinBuilder {
        FaceSkinBuilder {
            skin: FaceSkin {
                name: name.into(),
                twelve_hour: true,
                seconds_arc: false,
                step_label: "steps".to_string(),
            },
        }
    }

    /// Circle time display with a footsteps badge
    pub fn healthy_miami() -> Self {
        Self::builder("healthy-miami").step_label("👣").build()
    }

    /// Block-M digital face with a seconds arc
    pub fn digital() -> Self {
        Self::builder("digital").seconds_arc(true).build()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "healthy-miami" => Some(Self::healthy_miami()),
            "digital" => Some(Self::digital()),
            _ => None,
        }
    }
}

impl Default for FaceSkin {
    fn default() -> Self {
        Self::healthy_miami()
    }
}

#[derive(Debug, Clone)]
pub struct FaceSkinBuilder {
    skin: FaceSkin,
}

impl FaceSkinBuilder {
    pub fn twelve_hour(mut self, twelve_hour: bool) -> Self {
        self.skin.twelve_hour = twelve_hour;
        self
    }

    pub fn seconds_arc(mut self, seconds_arc: bool) -> Self {
        self.skin.seconds_arc = seconds_arc;
        self
    }

    pub fn step_label(mut self, label: impl Into<String>) -> Self {
        self.skin.step_label = label.into();
        self
    }

    pub fn build(self) -> FaceSkin {
        self.skin
    }
}
