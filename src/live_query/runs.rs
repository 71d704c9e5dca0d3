use crate::api::{Agent, Run, RunStep};

use super::store::StoreMessage;
use super::{LiveQueryClient, Loadable, QueryKey};

impl LiveQueryClient {
    pub fn runs(&self) -> Loadable<Vec<Run>> {
        self.load_if_needed(
            QueryKey::Runs,
            |client| async move { client.list_runs().await },
            |generation, runs| StoreMessage::RunsLoaded { generation, runs },
        );

        self.store.borrow().runs.clone()
    }

    /// Steps of one run. Each run id is fetched at most once until invalidated.
    pub fn run_trace(&self, run_id: &str) -> Loadable<Vec<RunStep>> {
        let run_id = run_id.to_string();
        self.load_if_needed(
            QueryKey::RunTrace(run_id.clone()),
            {
                let run_id = run_id.clone();
                move |client| async move { client.get_run_trace(&run_id).await }
            },
            {
                let run_id = run_id.clone();
                move |generation, steps| StoreMessage::RunTraceLoaded {
                    run_id,
                    generation,
                    steps,
                }
            },
        );

        self.store
            .borrow()
            .trace_states
            .get(&run_id)
            .cloned()
            .unwrap_or(Loadable::Idle)
    }

    pub fn agent(&self, agent_id: &str) -> Loadable<Agent> {
        let id = agent_id.to_string();
        self.load_if_needed(
            QueryKey::Agent(id.clone()),
            {
                let id = id.clone();
                move |client| async move { client.get_agent(&id).await }
            },
            {
                let id = id.clone();
                move |generation, agent| StoreMessage::AgentLoaded {
                    id,
                    generation,
                    agent,
                }
            },
        );

        self.store
            .borrow()
            .agent_states
            .get(&id)
            .cloned()
            .unwrap_or(Loadable::Idle)
    }

    pub fn invalidate_runs(&self) {
        self.invalidate(QueryKey::Runs);
    }

    pub fn invalidate_run_trace(&self, run_id: &str) {
        self.invalidate(QueryKey::RunTrace(run_id.to_string()));
    }
}
