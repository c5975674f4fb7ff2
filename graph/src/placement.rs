use crate::error::Error;

/// Worker/device coordinates, written `/job:local/replica:0/task:1/device:CPU:0`.
///
/// Only `job` is mandatory. The tag is advisory: it decides where a call would
/// run, never what it computes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlacementTag {
    pub job: String,
    pub replica: Option<u32>,
    pub task: Option<u32>,
    pub device: Option<String>,
}

impl PlacementTag {
    pub fn job(job: &str) -> Self {
        Self {
            job: job.to_owned(),
            replica: None,
            task: None,
            device: None,
        }
    }

    pub fn with_task(mut self, task: u32) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_owned());
        self
    }
}

peg::parser! { grammar tag() for str {
    pub rule placement() -> PlacementTag
        = "/job:" job:name()
          replica:("/replica:" n:index() { n })?
          task:("/task:" n:index() { n })?
          device:("/device:" d:device() { d })?
        { PlacementTag { job, replica, task, device } }

    rule name() -> String
        = n: quiet!{$(['a'..='z'|'A'..='Z'|'_']['a'..='z'|'A'..='Z'|'0'..='9'|'_'|'-']*)}
        { n.to_owned() }
        / expected!("job name")

    rule index() -> u32
        = n: quiet!{$(['0'..='9']+)}
        {? n.parse().or(Err("index too large")) }
        / expected!("index")

    rule device() -> String
        = d: quiet!{$(['a'..='z'|'A'..='Z'|'_']+ ":" ['0'..='9']+)}
        { d.to_owned() }
        / expected!("device (e.g. CPU:0)")
} }

impl std::str::FromStr for PlacementTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        tag::placement(s.trim()).map_err(|err| Error::Syntax {
            line: err.location.line,
            column: err.location.column,
            msg: format!("invalid placement tag, expected {}", err.expected),
        })
    }
}

impl std::fmt::Display for PlacementTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/job:{}", self.job)?;
        if let Some(replica) = self.replica {
            write!(f, "/replica:{}", replica)?;
        }
        if let Some(task) = self.task {
            write!(f, "/task:{}", task)?;
        }
        if let Some(device) = &self.device {
            write!(f, "/device:{}", device)?;
        }
        Ok(())
    }
}
