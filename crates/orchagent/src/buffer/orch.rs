//! Buffer orchestration logic.

use async_trait::async_trait;
use log::{debug, error, warn};

use swsm_orch_common::{
    parse_bind_key, parse_name_array, resolve_field_ref, resolve_field_ref_list, Consumer,
    KeyOpFieldsValues, Orch, RefResolveError, TaskStatus, TypeRegistry,
};
use swsm_sai::{
    BufferApi, BufferPoolAttr, BufferPoolOid, BufferProfileAttr, BufferProfileOid,
    TrafficDirection,
};

use super::types::{
    parse_pool_type, parse_threshold_mode, BufferTable, BUFFER_POOL_TABLE, BUFFER_PROFILE_TABLE,
    FIELD_DYNAMIC_TH, FIELD_MODE, FIELD_POOL, FIELD_PROFILE, FIELD_PROFILE_LIST, FIELD_SIZE,
    FIELD_STATIC_TH, FIELD_TYPE, FIELD_XOFF, FIELD_XON,
};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::ports::{lock_topology, SharedPortTopology};

/// Orchestrates the buffer object family: pools, profiles, and profile
/// bindings to queues, priority groups, and per-port profile lists.
///
/// Pools and profiles are named objects tracked in the registry; bindings
/// reference them by name and are re-applied whenever their update drains.
/// Draining is gated on the port topology being ready, since every binding
/// handler needs port handles.
pub struct BufferOrch {
    consumers: Vec<(BufferTable, Consumer)>,
    registry: TypeRegistry,
    sai: Box<dyn BufferApi>,
    ports: SharedPortTopology,
}

impl BufferOrch {
    pub fn new(sai: Box<dyn BufferApi>, ports: SharedPortTopology) -> Self {
        let consumers = BufferTable::ALL
            .into_iter()
            .map(|table| (table, Consumer::new(table.name())))
            .collect();
        Self {
            consumers,
            registry: TypeRegistry::with_tables([BUFFER_POOL_TABLE, BUFFER_PROFILE_TABLE]),
            sai,
            ports,
        }
    }

    /// Registry access for modules that resolve buffer references.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn drain(&mut self, idx: usize) {
        let table = self.consumers[idx].0;
        let mut pending = self.consumers[idx].1.take_pending();
        let mut halted = false;

        pending.retain(|key, update| {
            if halted {
                return true;
            }
            match self.process_update(table, key, update) {
                TaskStatus::Success | TaskStatus::InvalidEntry => false,
                TaskStatus::NeedRetry => true,
                TaskStatus::Failed => {
                    error!(
                        "{}: halting pass after failure on {}",
                        table.name(),
                        update.dump()
                    );
                    halted = true;
                    true
                }
            }
        });

        self.consumers[idx].1.restore_pending(pending);
    }

    fn process_update(
        &mut self,
        table: BufferTable,
        key: &str,
        update: &KeyOpFieldsValues,
    ) -> TaskStatus {
        match table {
            BufferTable::Pool => self.process_pool(key, update),
            BufferTable::Profile => self.process_profile(key, update),
            BufferTable::Queue => self.process_queue_binding(key, update),
            BufferTable::PriorityGroup => self.process_pg_binding(key, update),
            BufferTable::IngressProfileList => {
                self.process_profile_list(key, update, TrafficDirection::Ingress)
            }
            BufferTable::EgressProfileList => {
                self.process_profile_list(key, update, TrafficDirection::Egress)
            }
        }
    }

    fn process_pool(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        if update.op.is_del() {
            return self.remove_pool(key);
        }

        let mut attrs = Vec::new();
        if let Some(value) = update.get_field(FIELD_SIZE) {
            match value.parse::<u64>() {
                Ok(size) => attrs.push(BufferPoolAttr::Size(size)),
                Err(_) => {
                    warn!("pool {key}: bad size {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_TYPE) {
            match parse_pool_type(value) {
                Some(kind) => attrs.push(BufferPoolAttr::Type(kind)),
                None => {
                    warn!("pool {key}: bad type {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_MODE) {
            match parse_threshold_mode(value) {
                Some(mode) => attrs.push(BufferPoolAttr::ThresholdMode(mode)),
                None => {
                    warn!("pool {key}: bad mode {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        for (field, _) in &update.fvs {
            if !matches!(field.as_str(), FIELD_SIZE | FIELD_TYPE | FIELD_MODE) {
                debug!("pool {key}: skipping unrecognized field {field}");
            }
        }

        if let Some(raw) = self.registry.lookup(BUFFER_POOL_TABLE, key) {
            let pool = BufferPoolOid::from_oid(raw);
            for attr in attrs {
                if let Err(e) = self.sai.set_buffer_pool_attr(pool, attr) {
                    error!("pool {key}: set {attr:?} failed: {e}");
                    let record =
                        AuditRecord::new(AuditCategory::SaiOperation, "BufferOrch", "set_pool_attr")
                            .with_object_id(key)
                            .with_object_type("buffer_pool")
                            .with_error(e.to_string());
                    audit_log!(record);
                    return TaskStatus::Failed;
                }
            }
            let record =
                AuditRecord::new(AuditCategory::ResourceModify, "BufferOrch", "set_buffer_pool")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(key)
                    .with_object_type("buffer_pool");
            audit_log!(record);
            return TaskStatus::Success;
        }

        // Size and type are mandatory at creation time.
        let has_size = attrs.iter().any(|a| matches!(a, BufferPoolAttr::Size(_)));
        let has_type = attrs.iter().any(|a| matches!(a, BufferPoolAttr::Type(_)));
        if !has_size || !has_type {
            warn!("pool {key}: missing mandatory size/type at creation, discarding");
            return TaskStatus::InvalidEntry;
        }

        match self.sai.create_buffer_pool(&attrs) {
            Ok(pool) => {
                if let Err(e) = self.registry.insert(BUFFER_POOL_TABLE, key, pool.as_oid()) {
                    error!("pool {key}: registry insert failed: {e}");
                }
                let record = AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "BufferOrch",
                    "create_buffer_pool",
                )
                .with_outcome(AuditOutcome::Success)
                .with_object_id(key)
                .with_object_type("buffer_pool")
                .with_details(serde_json::json!({ "oid": format!("{:#x}", pool.as_raw()) }));
                audit_log!(record);
                TaskStatus::Success
            }
            Err(e) => {
                error!("pool {key}: create failed: {e}");
                let record = AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "BufferOrch",
                    "create_buffer_pool",
                )
                .with_object_id(key)
                .with_object_type("buffer_pool")
                .with_error(e.to_string());
                audit_log!(record);
                TaskStatus::Failed
            }
        }
    }

    fn remove_pool(&mut self, key: &str) -> TaskStatus {
        let raw = match self.registry.lookup(BUFFER_POOL_TABLE, key) {
            Some(raw) => raw,
            None => {
                debug!("pool {key}: delete for unregistered pool, nothing to do");
                return TaskStatus::Success;
            }
        };

        if let Err(e) = self.sai.remove_buffer_pool(BufferPoolOid::from_oid(raw)) {
            error!("pool {key}: remove failed: {e}");
            let record = AuditRecord::new(
                AuditCategory::ResourceDelete,
                "BufferOrch",
                "remove_buffer_pool",
            )
            .with_object_id(key)
            .with_object_type("buffer_pool")
            .with_error(e.to_string());
            audit_log!(record);
            return TaskStatus::Failed;
        }

        self.registry.erase(BUFFER_POOL_TABLE, key);
        let record = AuditRecord::new(
            AuditCategory::ResourceDelete,
            "BufferOrch",
            "remove_buffer_pool",
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(key)
        .with_object_type("buffer_pool");
        audit_log!(record);
        TaskStatus::Success
    }

    fn process_profile(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        if update.op.is_del() {
            return self.remove_profile(key);
        }

        let pool = match resolve_field_ref(&self.registry, FIELD_POOL, update) {
            Ok(maybe) => maybe.map(BufferPoolOid::from_oid),
            Err(err) => return self.ref_error_status(key, FIELD_POOL, err),
        };

        let mut attrs = Vec::new();
        if let Some(pool) = pool {
            attrs.push(BufferProfileAttr::PoolId(pool));
        }
        for (field, build) in [
            (
                FIELD_SIZE,
                BufferProfileAttr::ReservedSize as fn(u64) -> BufferProfileAttr,
            ),
            (FIELD_XON, BufferProfileAttr::XonThreshold),
            (FIELD_XOFF, BufferProfileAttr::XoffThreshold),
            (FIELD_STATIC_TH, BufferProfileAttr::StaticThreshold),
        ] {
            if let Some(value) = update.get_field(field) {
                match value.parse::<u64>() {
                    Ok(v) => attrs.push(build(v)),
                    Err(_) => {
                        warn!("profile {key}: bad {field} {value:?}, discarding");
                        return TaskStatus::InvalidEntry;
                    }
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_DYNAMIC_TH) {
            match value.parse::<i64>() {
                Ok(v) => attrs.push(BufferProfileAttr::DynamicThreshold(v)),
                Err(_) => {
                    warn!("profile {key}: bad dynamic_th {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        for (field, _) in &update.fvs {
            if !matches!(
                field.as_str(),
                FIELD_POOL | FIELD_SIZE | FIELD_XON | FIELD_XOFF | FIELD_DYNAMIC_TH | FIELD_STATIC_TH
            ) {
                debug!("profile {key}: skipping unrecognized field {field}");
            }
        }

        if let Some(raw) = self.registry.lookup(BUFFER_PROFILE_TABLE, key) {
            let profile = BufferProfileOid::from_oid(raw);
            for attr in attrs {
                if let Err(e) = self.sai.set_buffer_profile_attr(profile, attr) {
                    error!("profile {key}: set {attr:?} failed: {e}");
                    let record = AuditRecord::new(
                        AuditCategory::SaiOperation,
                        "BufferOrch",
                        "set_profile_attr",
                    )
                    .with_object_id(key)
                    .with_object_type("buffer_profile")
                    .with_error(e.to_string());
                    audit_log!(record);
                    return TaskStatus::Failed;
                }
            }
            return TaskStatus::Success;
        }

        // The pool reference is mandatory at creation time.
        if pool.is_none() {
            warn!("profile {key}: missing mandatory pool at creation, discarding");
            return TaskStatus::InvalidEntry;
        }

        match self.sai.create_buffer_profile(&attrs) {
            Ok(profile) => {
                if let Err(e) = self
                    .registry
                    .insert(BUFFER_PROFILE_TABLE, key, profile.as_oid())
                {
                    error!("profile {key}: registry insert failed: {e}");
                }
                let record = AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "BufferOrch",
                    "create_buffer_profile",
                )
                .with_outcome(AuditOutcome::Success)
                .with_object_id(key)
                .with_object_type("buffer_profile")
                .with_details(serde_json::json!({ "oid": format!("{:#x}", profile.as_raw()) }));
                audit_log!(record);
                TaskStatus::Success
            }
            Err(e) => {
                error!("profile {key}: create failed: {e}");
                let record = AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "BufferOrch",
                    "create_buffer_profile",
                )
                .with_object_id(key)
                .with_object_type("buffer_profile")
                .with_error(e.to_string());
                audit_log!(record);
                TaskStatus::Failed
            }
        }
    }

    fn remove_profile(&mut self, key: &str) -> TaskStatus {
        let raw = match self.registry.lookup(BUFFER_PROFILE_TABLE, key) {
            Some(raw) => raw,
            None => {
                debug!("profile {key}: delete for unregistered profile, nothing to do");
                return TaskStatus::Success;
            }
        };

        if let Err(e) = self.sai.remove_buffer_profile(BufferProfileOid::from_oid(raw)) {
            error!("profile {key}: remove failed: {e}");
            let record = AuditRecord::new(
                AuditCategory::ResourceDelete,
                "BufferOrch",
                "remove_buffer_profile",
            )
            .with_object_id(key)
            .with_object_type("buffer_profile")
            .with_error(e.to_string());
            audit_log!(record);
            return TaskStatus::Failed;
        }

        self.registry.erase(BUFFER_PROFILE_TABLE, key);
        let record = AuditRecord::new(
            AuditCategory::ResourceDelete,
            "BufferOrch",
            "remove_buffer_profile",
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(key)
        .with_object_type("buffer_profile");
        audit_log!(record);
        TaskStatus::Success
    }

    /// Resolves the target profile of a queue/PG binding update.
    ///
    /// DEL means detach. SET without a profile field is invalid: a binding
    /// carries nothing else.
    fn binding_profile(
        &self,
        key: &str,
        update: &KeyOpFieldsValues,
    ) -> Result<Option<BufferProfileOid>, TaskStatus> {
        if update.op.is_del() {
            return Ok(None);
        }
        match resolve_field_ref(&self.registry, FIELD_PROFILE, update) {
            Ok(Some(raw)) => Ok(Some(BufferProfileOid::from_oid(raw))),
            Ok(None) => {
                warn!("binding {key}: missing profile field, discarding");
                Err(TaskStatus::InvalidEntry)
            }
            Err(err) => Err(self.ref_error_status(key, FIELD_PROFILE, err)),
        }
    }

    fn process_queue_binding(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        let profile = match self.binding_profile(key, update) {
            Ok(profile) => profile,
            Err(status) => return status,
        };
        let (aliases, range) = match parse_bind_key(key) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("queue binding {key}: {e}, discarding");
                return TaskStatus::InvalidEntry;
            }
        };

        // Resolve every target before programming any, so a bad alias or
        // index leaves hardware untouched.
        let mut queues = Vec::new();
        {
            let topology = lock_topology(&self.ports);
            for alias in &aliases {
                let port = match topology.get_port(alias) {
                    Some(port) => port,
                    None => {
                        warn!("queue binding {key}: unknown port {alias}, discarding");
                        return TaskStatus::InvalidEntry;
                    }
                };
                for index in range.clone() {
                    match port.queue(index) {
                        Some(queue) => queues.push(queue),
                        None => {
                            warn!("queue binding {key}: {alias} has no queue {index}, discarding");
                            return TaskStatus::InvalidEntry;
                        }
                    }
                }
            }
        }

        for queue in queues {
            if let Err(e) = self.sai.set_queue_buffer_profile(queue, profile) {
                error!("queue binding {key}: apply failed: {e}");
                let record = AuditRecord::new(
                    AuditCategory::SaiOperation,
                    "BufferOrch",
                    "set_queue_buffer_profile",
                )
                .with_object_id(key)
                .with_object_type("queue_binding")
                .with_error(e.to_string());
                audit_log!(record);
                return TaskStatus::Failed;
            }
        }
        TaskStatus::Success
    }

    fn process_pg_binding(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        let profile = match self.binding_profile(key, update) {
            Ok(profile) => profile,
            Err(status) => return status,
        };
        let (aliases, range) = match parse_bind_key(key) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("pg binding {key}: {e}, discarding");
                return TaskStatus::InvalidEntry;
            }
        };

        let mut groups = Vec::new();
        {
            let topology = lock_topology(&self.ports);
            for alias in &aliases {
                let port = match topology.get_port(alias) {
                    Some(port) => port,
                    None => {
                        warn!("pg binding {key}: unknown port {alias}, discarding");
                        return TaskStatus::InvalidEntry;
                    }
                };
                for index in range.clone() {
                    match port.priority_group(index) {
                        Some(pg) => groups.push(pg),
                        None => {
                            warn!("pg binding {key}: {alias} has no pg {index}, discarding");
                            return TaskStatus::InvalidEntry;
                        }
                    }
                }
            }
        }

        for pg in groups {
            if let Err(e) = self.sai.set_priority_group_buffer_profile(pg, profile) {
                error!("pg binding {key}: apply failed: {e}");
                let record = AuditRecord::new(
                    AuditCategory::SaiOperation,
                    "BufferOrch",
                    "set_priority_group_buffer_profile",
                )
                .with_object_id(key)
                .with_object_type("pg_binding")
                .with_error(e.to_string());
                audit_log!(record);
                return TaskStatus::Failed;
            }
        }
        TaskStatus::Success
    }

    fn process_profile_list(
        &mut self,
        key: &str,
        update: &KeyOpFieldsValues,
        direction: TrafficDirection,
    ) -> TaskStatus {
        let aliases = match parse_name_array(key) {
            Ok(aliases) => aliases,
            Err(e) => {
                warn!("profile list {key}: {e}, discarding");
                return TaskStatus::InvalidEntry;
            }
        };

        let profiles: Vec<BufferProfileOid> = if update.op.is_del() {
            Vec::new()
        } else {
            match resolve_field_ref_list(&self.registry, FIELD_PROFILE_LIST, update) {
                Ok(Some(raws)) => raws.into_iter().map(BufferProfileOid::from_oid).collect(),
                Ok(None) => {
                    warn!("profile list {key}: missing profile_list field, discarding");
                    return TaskStatus::InvalidEntry;
                }
                Err(err) => return self.ref_error_status(key, FIELD_PROFILE_LIST, err),
            }
        };

        let mut ports = Vec::new();
        {
            let topology = lock_topology(&self.ports);
            for alias in &aliases {
                match topology.port_id(alias) {
                    Some(port) => ports.push(port),
                    None => {
                        warn!("profile list {key}: unknown port {alias}, discarding");
                        return TaskStatus::InvalidEntry;
                    }
                }
            }
        }

        for port in ports {
            if let Err(e) = self
                .sai
                .set_port_buffer_profile_list(port, direction, &profiles)
            {
                error!("profile list {key}: apply failed: {e}");
                let record = AuditRecord::new(
                    AuditCategory::SaiOperation,
                    "BufferOrch",
                    "set_port_buffer_profile_list",
                )
                .with_object_id(key)
                .with_object_type("port_profile_list")
                .with_error(e.to_string());
                audit_log!(record);
                return TaskStatus::Failed;
            }
        }
        TaskStatus::Success
    }

    fn ref_error_status(&self, key: &str, field: &str, err: RefResolveError) -> TaskStatus {
        match err {
            RefResolveError::NotResolved => {
                debug!("{key}: dependency in field {field} not ready, will retry");
                TaskStatus::NeedRetry
            }
            RefResolveError::Malformed | RefResolveError::MultipleInstances => {
                warn!("{key}: bad reference in field {field} ({err}), discarding");
                TaskStatus::InvalidEntry
            }
        }
    }
}

#[async_trait]
impl Orch for BufferOrch {
    fn name(&self) -> &str {
        "BufferOrch"
    }

    fn table_names(&self) -> Vec<&str> {
        self.consumers.iter().map(|(t, _)| t.name()).collect()
    }

    fn add_to_sync(&mut self, table: &str, entry: KeyOpFieldsValues) -> bool {
        for (_, consumer) in &mut self.consumers {
            if consumer.table_name() == table {
                consumer.add_to_sync(entry);
                return true;
            }
        }
        false
    }

    async fn do_task(&mut self) {
        if !lock_topology(&self.ports).is_ready() {
            debug!("port topology not ready, deferring buffer drain");
            return;
        }
        for idx in 0..self.consumers.len() {
            self.drain(idx);
        }
    }

    fn priority(&self) -> i32 {
        35
    }

    fn has_pending_tasks(&self) -> bool {
        self.consumers.iter().any(|(_, c)| c.has_pending())
    }

    fn dump_pending_tasks(&self) -> Vec<String> {
        self.consumers.iter().flat_map(|(_, c)| c.dump()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{shared_topology, Port, PortTopology};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use swsm_sai::{IngressPriorityGroupOid, PortOid, QueueOid, SaiError};

    use super::super::types::{
        BUFFER_PG_TABLE, BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE, BUFFER_QUEUE_TABLE,
    };

    #[derive(Default)]
    struct MockState {
        calls: Vec<String>,
        next_oid: u64,
        fail_all: bool,
    }

    #[derive(Clone)]
    struct MockSai(Arc<Mutex<MockState>>);

    impl MockSai {
        fn new() -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState {
                next_oid: 0x1000,
                ..MockState::default()
            }));
            (Self(state.clone()), state)
        }

        fn next_oid(&self) -> Result<u64, SaiError> {
            let mut state = self.0.lock().unwrap();
            if state.fail_all {
                return Err(SaiError::internal("simulated failure"));
            }
            let oid = state.next_oid;
            state.next_oid += 1;
            Ok(oid)
        }

        fn record(&self, call: String) -> Result<(), SaiError> {
            let mut state = self.0.lock().unwrap();
            if state.fail_all {
                return Err(SaiError::internal("simulated failure"));
            }
            state.calls.push(call);
            Ok(())
        }
    }

    impl BufferApi for MockSai {
        fn create_buffer_pool(&mut self, attrs: &[BufferPoolAttr]) -> Result<BufferPoolOid, SaiError> {
            let oid = self.next_oid()?;
            self.0.lock().unwrap().calls.push(format!("create_pool {attrs:?}"));
            Ok(BufferPoolOid::from_raw(oid).unwrap())
        }

        fn set_buffer_pool_attr(
            &mut self,
            pool: BufferPoolOid,
            attr: BufferPoolAttr,
        ) -> Result<(), SaiError> {
            self.record(format!("set_pool {:#x} {attr:?}", pool.as_raw()))
        }

        fn remove_buffer_pool(&mut self, pool: BufferPoolOid) -> Result<(), SaiError> {
            self.record(format!("remove_pool {:#x}", pool.as_raw()))
        }

        fn create_buffer_profile(
            &mut self,
            attrs: &[BufferProfileAttr],
        ) -> Result<BufferProfileOid, SaiError> {
            let oid = self.next_oid()?;
            self.0
                .lock()
                .unwrap()
                .calls
                .push(format!("create_profile {attrs:?}"));
            Ok(BufferProfileOid::from_raw(oid).unwrap())
        }

        fn set_buffer_profile_attr(
            &mut self,
            profile: BufferProfileOid,
            attr: BufferProfileAttr,
        ) -> Result<(), SaiError> {
            self.record(format!("set_profile {:#x} {attr:?}", profile.as_raw()))
        }

        fn remove_buffer_profile(&mut self, profile: BufferProfileOid) -> Result<(), SaiError> {
            self.record(format!("remove_profile {:#x}", profile.as_raw()))
        }

        fn set_queue_buffer_profile(
            &mut self,
            queue: QueueOid,
            profile: Option<BufferProfileOid>,
        ) -> Result<(), SaiError> {
            self.record(format!(
                "bind_queue {:#x} {:?}",
                queue.as_raw(),
                profile.map(|p| p.as_raw())
            ))
        }

        fn set_priority_group_buffer_profile(
            &mut self,
            pg: IngressPriorityGroupOid,
            profile: Option<BufferProfileOid>,
        ) -> Result<(), SaiError> {
            self.record(format!(
                "bind_pg {:#x} {:?}",
                pg.as_raw(),
                profile.map(|p| p.as_raw())
            ))
        }

        fn set_port_buffer_profile_list(
            &mut self,
            port: PortOid,
            direction: TrafficDirection,
            profiles: &[BufferProfileOid],
        ) -> Result<(), SaiError> {
            let raws: Vec<u64> = profiles.iter().map(|p| p.as_raw()).collect();
            self.record(format!(
                "profile_list {:#x} {direction:?} {raws:?}",
                port.as_raw()
            ))
        }
    }

    fn test_port(alias: &str, base: u64) -> Port {
        Port {
            alias: alias.to_string(),
            port_id: PortOid::from_raw(base).unwrap(),
            queues: (1..=8)
                .map(|i| QueueOid::from_raw(base + i).unwrap())
                .collect(),
            priority_groups: (11..=18)
                .map(|i| IngressPriorityGroupOid::from_raw(base + i).unwrap())
                .collect(),
        }
    }

    fn ready_topology() -> SharedPortTopology {
        let mut topology = PortTopology::new();
        topology.add_port(test_port("Ethernet0", 0x100));
        topology.add_port(test_port("Ethernet4", 0x200));
        topology.set_ready();
        shared_topology(topology)
    }

    fn fv(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_pool_create_and_update() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        assert!(orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "1024"), ("type", "ingress")])),
        ));
        orch.do_task().await;

        assert!(!orch.has_pending_tasks());
        assert!(orch.registry().contains(BUFFER_POOL_TABLE, "pool0"));

        // A later SET on the registered pool updates attributes in place.
        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "2048")])),
        );
        orch.do_task().await;

        let calls = state.lock().unwrap().calls.clone();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("create_pool"));
        assert!(calls[1].contains("Size(2048)"));
    }

    #[tokio::test]
    async fn test_pool_create_requires_size_and_type() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "1024")])),
        );
        orch.do_task().await;

        // Discarded, not retried.
        assert!(!orch.has_pending_tasks());
        assert!(!orch.registry().contains(BUFFER_POOL_TABLE, "pool0"));
        assert!(state.lock().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_profile_waits_for_pool() {
        let (sai, _state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(
            BUFFER_PROFILE_TABLE,
            KeyOpFieldsValues::set(
                "prof0",
                fv(&[("pool", "[BUFFER_POOL_TABLE:pool0]"), ("size", "100")]),
            ),
        );
        orch.do_task().await;

        // The pool does not exist yet: the profile stays pending.
        assert!(orch.has_pending_tasks());
        assert!(!orch.registry().contains(BUFFER_PROFILE_TABLE, "prof0"));

        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "1024"), ("type", "ingress")])),
        );
        orch.do_task().await;

        // Pools drain before profiles, so one pass converges both.
        assert!(!orch.has_pending_tasks());
        assert!(orch.registry().contains(BUFFER_PROFILE_TABLE, "prof0"));
    }

    #[tokio::test]
    async fn test_queue_binding_expansion_order() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "1024"), ("type", "egress")])),
        );
        orch.add_to_sync(
            BUFFER_PROFILE_TABLE,
            KeyOpFieldsValues::set("prof0", fv(&[("pool", "[BUFFER_POOL_TABLE:pool0]")])),
        );
        orch.add_to_sync(
            BUFFER_QUEUE_TABLE,
            KeyOpFieldsValues::set(
                "Ethernet0,Ethernet4:2-3",
                fv(&[("profile", "[BUFFER_PROFILE_TABLE:prof0]")]),
            ),
        );
        orch.do_task().await;
        assert!(!orch.has_pending_tasks());

        // Alias-major, index-ascending: queue handle for index i is base+1+i.
        let calls = state.lock().unwrap().calls.clone();
        let binds: Vec<&String> = calls.iter().filter(|c| c.starts_with("bind_queue")).collect();
        assert_eq!(binds.len(), 4);
        assert!(binds[0].starts_with("bind_queue 0x103"));
        assert!(binds[1].starts_with("bind_queue 0x104"));
        assert!(binds[2].starts_with("bind_queue 0x203"));
        assert!(binds[3].starts_with("bind_queue 0x204"));
    }

    #[tokio::test]
    async fn test_binding_del_detaches() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(BUFFER_PG_TABLE, KeyOpFieldsValues::del("Ethernet0:0"));
        orch.do_task().await;

        let calls = state.lock().unwrap().calls.clone();
        assert_eq!(calls, ["bind_pg 0x10b None"]);
    }

    #[tokio::test]
    async fn test_unknown_port_is_invalid() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(BUFFER_QUEUE_TABLE, KeyOpFieldsValues::del("Ethernet99:0"));
        orch.do_task().await;

        assert!(!orch.has_pending_tasks());
        assert!(state.lock().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_profile_list_del_clears() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());

        orch.add_to_sync(
            BUFFER_PORT_EGRESS_PROFILE_LIST_TABLE,
            KeyOpFieldsValues::del("Ethernet0,Ethernet4"),
        );
        orch.do_task().await;

        let calls = state.lock().unwrap().calls.clone();
        assert_eq!(
            calls,
            [
                "profile_list 0x100 Egress []",
                "profile_list 0x200 Egress []"
            ]
        );
    }

    #[tokio::test]
    async fn test_not_ready_topology_defers_everything() {
        let (sai, state) = MockSai::new();
        let topology = shared_topology(PortTopology::new());
        let mut orch = BufferOrch::new(Box::new(sai), topology);

        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("pool0", fv(&[("size", "1024"), ("type", "ingress")])),
        );
        orch.do_task().await;

        assert!(orch.has_pending_tasks());
        assert!(state.lock().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_hardware_failure_halts_table_pass() {
        let (sai, state) = MockSai::new();
        let mut orch = BufferOrch::new(Box::new(sai), ready_topology());
        state.lock().unwrap().fail_all = true;

        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("a", fv(&[("size", "1"), ("type", "ingress")])),
        );
        orch.add_to_sync(
            BUFFER_POOL_TABLE,
            KeyOpFieldsValues::set("b", fv(&[("size", "2"), ("type", "ingress")])),
        );
        orch.do_task().await;

        // Both entries survive: the failed one and everything after it.
        assert_eq!(orch.dump_pending_tasks().len(), 2);
    }
}
