use crate::error::Error;
use graph::PlacementTag;
use std::collections::BTreeMap;

/// Job name to endpoint list, plus the identity of the worker doing the evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescriptor {
    jobs: BTreeMap<String, Vec<String>>,
    job: String,
    task: u32,
}

impl ClusterDescriptor {
    pub fn new(jobs: BTreeMap<String, Vec<String>>, job: &str, task: u32) -> Result<Self, Error> {
        if let Some((name, _)) = jobs.iter().find(|(_, endpoints)| endpoints.is_empty()) {
            return Err(Error::InvalidCluster {
                reason: format!("job `{}` has no endpoints", name),
            });
        }
        match jobs.get(job) {
            None => {
                return Err(Error::InvalidCluster {
                    reason: format!("this worker's job `{}` is not in the cluster", job),
                })
            }
            Some(endpoints) if task as usize >= endpoints.len() => {
                return Err(Error::InvalidCluster {
                    reason: format!(
                        "task {} is out of range for job `{}` with {} endpoint(s)",
                        task,
                        job,
                        endpoints.len()
                    ),
                })
            }
            Some(_) => {}
        }

        Ok(Self {
            jobs,
            job: job.to_owned(),
            task,
        })
    }

    /// Builds a descriptor from `name=host:port,...` job specs.
    pub fn from_specs<S: AsRef<str>>(specs: &[S], job: &str, task: u32) -> Result<Self, Error> {
        let mut jobs = BTreeMap::new();
        for spec in specs {
            let (name, endpoints) = parse_job_spec(spec.as_ref())?;
            if jobs.insert(name.clone(), endpoints).is_some() {
                return Err(Error::InvalidCluster {
                    reason: format!("job `{}` is listed twice", name),
                });
            }
        }
        Self::new(jobs, job, task)
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn task(&self) -> u32 {
        self.task
    }

    pub fn resolve_endpoint(&self, worker: &str) -> Result<&[String], Error> {
        self.jobs
            .get(worker)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownWorker {
                name: worker.to_owned(),
            })
    }

    /// The endpoint serving `tag`. A tag without a task means task 0.
    pub fn endpoint_for(&self, tag: &PlacementTag) -> Result<&str, Error> {
        let endpoints = self.resolve_endpoint(&tag.job)?;
        let task = tag.task.unwrap_or(0);
        endpoints
            .get(task as usize)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownWorker {
                name: format!("/job:{}/task:{}", tag.job, task),
            })
    }

    pub fn is_local(&self, tag: &PlacementTag) -> bool {
        tag.job == self.job && tag.task.map_or(true, |task| task == self.task)
    }

    /// The same cluster seen from another worker.
    pub fn as_task(&self, job: &str, task: u32) -> Result<Self, Error> {
        Self::new(self.jobs.clone(), job, task)
    }
}

peg::parser! { grammar cluster_def() for str {
    pub rule job() -> (String, Vec<String>)
        = _ name:name() _ "=" _ endpoints:(endpoint() ++ (_ "," _)) _
        { (name, endpoints) }

    rule name() -> String
        = n: quiet!{$(['a'..='z'|'A'..='Z'|'_']['a'..='z'|'A'..='Z'|'0'..='9'|'_'|'-']*)}
        { n.to_owned() }
        / expected!("job name")

    rule endpoint() -> String
        = e: quiet!{$((!['=' | ',' | ':' | ' ' | '\t'][_])+ ":" ['0'..='9']+)}
        { e.to_owned() }
        / expected!("host:port")

    rule _ = [' ' | '\t']*
}}

/// Parses `name=host:port,host:port`.
pub fn parse_job_spec(text: &str) -> Result<(String, Vec<String>), Error> {
    cluster_def::job(text).map_err(|e| Error::InvalidCluster {
        reason: format!("`{}`: expected {} at column {}", text, e.expected, e.location.column),
    })
}
