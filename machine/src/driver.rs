/// Numeric resource request for machine creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineResources {
    pub memory_mb: u32,
    pub disk_size_mb: u32,
    pub cpu_count: u32,
}

/// Driver used when creating machines from numeric resources.
///
/// Each backend spells its resource flags differently, so the flag names
/// live next to the driver name instead of being hardcoded at the call
/// site. [`virtualbox`](Self::virtualbox) is the stock configuration and
/// the default; `new` admits any other backend without touching callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDriver {
    name: String,
    memory_flag: String,
    disk_flag: String,
    cpu_flag: String,
}

impl ResourceDriver {
    pub fn new(
        name: impl Into<String>,
        memory_flag: impl Into<String>,
        disk_flag: impl Into<String>,
        cpu_flag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            memory_flag: memory_flag.into(),
            disk_flag: disk_flag.into(),
            cpu_flag: cpu_flag.into(),
        }
    }

    /// The stock VirtualBox driver.
    pub fn virtualbox() -> Self {
        Self::new(
            "virtualbox",
            "--virtualbox-memory",
            "--virtualbox-disk-size",
            "--virtualbox-cpu-count",
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the resource flags as option strings, values quoted the way
    /// the tool's own documentation writes them.
    pub fn options(&self, resources: &MachineResources) -> Vec<String> {
        vec![
            format!("{} \"{}\"", self.memory_flag, resources.memory_mb),
            format!("{} \"{}\"", self.disk_flag, resources.disk_size_mb),
            format!("{} \"{}\"", self.cpu_flag, resources.cpu_count),
        ]
    }
}

impl Default for ResourceDriver {
    fn default() -> Self {
        Self::virtualbox()
    }
}
