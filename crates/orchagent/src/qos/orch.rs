//! QoS orchestration logic.

use async_trait::async_trait;
use log::{debug, error, warn};

use swsm_orch_common::{
    parse_bind_key, parse_name_array, resolve_field_ref, Consumer, KeyOpFieldsValues, Orch,
    RefResolveError, TaskStatus, TypeRegistry,
};
use swsm_sai::{
    QosApi, QosMapAttr, QosMapOid, QosMapType, SchedulerAttr, SchedulerOid, WredAttr, WredOid,
};

use super::types::{
    parse_ecn_mode, parse_scheduling_type, QosTable, DSCP_MAX, DSCP_TO_TC_MAP_TABLE, FIELD_DSCP_TO_TC_MAP,
    FIELD_ECN, FIELD_GREEN_DROP_PROBABILITY, FIELD_GREEN_MAX_THRESHOLD, FIELD_GREEN_MIN_THRESHOLD,
    FIELD_SCHEDULER, FIELD_TC_TO_QUEUE_MAP, FIELD_TYPE, FIELD_WEIGHT, FIELD_WRED_PROFILE,
    SCHEDULER_TABLE, TC_MAX, TC_TO_QUEUE_MAP_TABLE, WRED_PROFILE_TABLE,
};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::ports::{lock_topology, SharedPortTopology};

/// Orchestrates the QoS object family: classification maps, scheduler and
/// WRED profiles, and their bindings to queues and ports.
///
/// Map and profile tables drain before the binding tables, so a binding
/// whose target arrived in the same batch resolves in a single pass.
pub struct QosOrch {
    consumers: Vec<(QosTable, Consumer)>,
    registry: TypeRegistry,
    sai: Box<dyn QosApi>,
    ports: SharedPortTopology,
}

impl QosOrch {
    pub fn new(sai: Box<dyn QosApi>, ports: SharedPortTopology) -> Self {
        let consumers = QosTable::ALL
            .into_iter()
            .map(|table| (table, Consumer::new(table.name())))
            .collect();
        Self {
            consumers,
            registry: TypeRegistry::with_tables([
                DSCP_TO_TC_MAP_TABLE,
                TC_TO_QUEUE_MAP_TABLE,
                SCHEDULER_TABLE,
                WRED_PROFILE_TABLE,
            ]),
            sai,
            ports,
        }
    }

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
        table: QosTable,
        key: &str,
        update: &KeyOpFieldsValues,
    ) -> TaskStatus {
        match table {
            QosTable::DscpToTcMap => self.process_map(key, update, QosMapType::DscpToTc),
            QosTable::TcToQueueMap => self.process_map(key, update, QosMapType::TcToQueue),
            QosTable::Scheduler => self.process_scheduler(key, update),
            QosTable::WredProfile => self.process_wred(key, update),
            QosTable::Queue => self.process_queue_binding(key, update),
            QosTable::PortQosMap => self.process_port_qos_map(key, update),
        }
    }

    fn map_table_name(kind: QosMapType) -> &'static str {
        match kind {
            QosMapType::DscpToTc => DSCP_TO_TC_MAP_TABLE,
            QosMapType::TcToQueue => TC_TO_QUEUE_MAP_TABLE,
        }
    }

    fn process_map(&mut self, key: &str, update: &KeyOpFieldsValues, kind: QosMapType) -> TaskStatus {
        let table = Self::map_table_name(kind);

        if update.op.is_del() {
            let raw = match self.registry.lookup(table, key) {
                Some(raw) => raw,
                None => {
                    debug!("map {key}: delete for unregistered map, nothing to do");
                    return TaskStatus::Success;
                }
            };
            if let Err(e) = self.sai.remove_qos_map(QosMapOid::from_oid(raw)) {
                error!("map {key}: remove failed: {e}");
                return TaskStatus::Failed;
            }
            self.registry.erase(table, key);
            let record = AuditRecord::new(AuditCategory::ResourceDelete, "QosOrch", "remove_qos_map")
                .with_outcome(AuditOutcome::Success)
                .with_object_id(key)
                .with_object_type("qos_map");
            audit_log!(record);
            return TaskStatus::Success;
        }

        // Every field is one (from, to) entry of the map.
        let (from_max, to_max) = match kind {
            QosMapType::DscpToTc => (DSCP_MAX, TC_MAX),
            QosMapType::TcToQueue => (TC_MAX, TC_MAX),
        };
        let mut entries = Vec::with_capacity(update.fvs.len());
        for (field, value) in &update.fvs {
            let from = match field.parse::<u8>() {
                Ok(v) if v <= from_max => v,
                _ => {
                    warn!("map {key}: bad entry key {field:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            };
            let to = match value.parse::<u8>() {
                Ok(v) if v <= to_max => v,
                _ => {
                    warn!("map {key}: bad entry value {value:?} for {field}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            };
            entries.push((from, to));
        }
        if entries.is_empty() {
            warn!("map {key}: no entries, discarding");
            return TaskStatus::InvalidEntry;
        }

        if let Some(raw) = self.registry.lookup(table, key) {
            let map = QosMapOid::from_oid(raw);
            if let Err(e) = self
                .sai
                .set_qos_map_attr(map, QosMapAttr::MapToValueList(entries))
            {
                error!("map {key}: update failed: {e}");
                return TaskStatus::Failed;
            }
            return TaskStatus::Success;
        }

        let attrs = [QosMapAttr::Type(kind), QosMapAttr::MapToValueList(entries)];
        match self.sai.create_qos_map(&attrs) {
            Ok(map) => {
                if let Err(e) = self.registry.insert(table, key, map.as_oid()) {
                    error!("map {key}: registry insert failed: {e}");
                }
                let record =
                    AuditRecord::new(AuditCategory::ResourceCreate, "QosOrch", "create_qos_map")
                        .with_outcome(AuditOutcome::Success)
                        .with_object_id(key)
                        .with_object_type("qos_map")
                        .with_details(serde_json::json!({
                            "kind": format!("{kind:?}"),
                            "oid": format!("{:#x}", map.as_raw()),
                        }));
                audit_log!(record);
                TaskStatus::Success
            }
            Err(e) => {
                error!("map {key}: create failed: {e}");
                let record =
                    AuditRecord::new(AuditCategory::ResourceCreate, "QosOrch", "create_qos_map")
                        .with_object_id(key)
                        .with_object_type("qos_map")
                        .with_error(e.to_string());
                audit_log!(record);
                TaskStatus::Failed
            }
        }
    }

    fn process_scheduler(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        if update.op.is_del() {
            let raw = match self.registry.lookup(SCHEDULER_TABLE, key) {
                Some(raw) => raw,
                None => {
                    debug!("scheduler {key}: delete for unregistered scheduler, nothing to do");
                    return TaskStatus::Success;
                }
            };
            if let Err(e) = self.sai.remove_scheduler(SchedulerOid::from_oid(raw)) {
                error!("scheduler {key}: remove failed: {e}");
                return TaskStatus::Failed;
            }
            self.registry.erase(SCHEDULER_TABLE, key);
            let record =
                AuditRecord::new(AuditCategory::ResourceDelete, "QosOrch", "remove_scheduler")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(key)
                    .with_object_type("scheduler");
            audit_log!(record);
            return TaskStatus::Success;
        }

        let mut attrs = Vec::new();
        if let Some(value) = update.get_field(FIELD_TYPE) {
            match parse_scheduling_type(value) {
                Some(kind) => attrs.push(SchedulerAttr::Type(kind)),
                None => {
                    warn!("scheduler {key}: bad type {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_WEIGHT) {
            match value.parse::<u8>() {
                Ok(weight) if weight > 0 => attrs.push(SchedulerAttr::Weight(weight)),
                _ => {
                    warn!("scheduler {key}: bad weight {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        for (field, _) in &update.fvs {
            if !matches!(field.as_str(), FIELD_TYPE | FIELD_WEIGHT) {
                debug!("scheduler {key}: skipping unrecognized field {field}");
            }
        }

        if let Some(raw) = self.registry.lookup(SCHEDULER_TABLE, key) {
            let scheduler = SchedulerOid::from_oid(raw);
            for attr in attrs {
                if let Err(e) = self.sai.set_scheduler_attr(scheduler, attr) {
                    error!("scheduler {key}: set {attr:?} failed: {e}");
                    return TaskStatus::Failed;
                }
            }
            return TaskStatus::Success;
        }

        // The discipline is mandatory at creation time.
        if !attrs.iter().any(|a| matches!(a, SchedulerAttr::Type(_))) {
            warn!("scheduler {key}: missing mandatory type at creation, discarding");
            return TaskStatus::InvalidEntry;
        }

        match self.sai.create_scheduler(&attrs) {
            Ok(scheduler) => {
                if let Err(e) = self
                    .registry
                    .insert(SCHEDULER_TABLE, key, scheduler.as_oid())
                {
                    error!("scheduler {key}: registry insert failed: {e}");
                }
                let record =
                    AuditRecord::new(AuditCategory::ResourceCreate, "QosOrch", "create_scheduler")
                        .with_outcome(AuditOutcome::Success)
                        .with_object_id(key)
                        .with_object_type("scheduler");
                audit_log!(record);
                TaskStatus::Success
            }
            Err(e) => {
                error!("scheduler {key}: create failed: {e}");
                TaskStatus::Failed
            }
        }
    }

    fn process_wred(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        if update.op.is_del() {
            let raw = match self.registry.lookup(WRED_PROFILE_TABLE, key) {
                Some(raw) => raw,
                None => {
                    debug!("wred {key}: delete for unregistered profile, nothing to do");
                    return TaskStatus::Success;
                }
            };
            if let Err(e) = self.sai.remove_wred(WredOid::from_oid(raw)) {
                error!("wred {key}: remove failed: {e}");
                return TaskStatus::Failed;
            }
            self.registry.erase(WRED_PROFILE_TABLE, key);
            let record =
                AuditRecord::new(AuditCategory::ResourceDelete, "QosOrch", "remove_wred")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(key)
                    .with_object_type("wred_profile");
            audit_log!(record);
            return TaskStatus::Success;
        }

        let mut min = None;
        let mut max = None;
        let mut attrs = Vec::new();
        if let Some(value) = update.get_field(FIELD_GREEN_MIN_THRESHOLD) {
            match value.parse::<u32>() {
                Ok(v) => min = Some(v),
                Err(_) => {
                    warn!("wred {key}: bad green_min_threshold {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_GREEN_MAX_THRESHOLD) {
            match value.parse::<u32>() {
                Ok(v) => max = Some(v),
                Err(_) => {
                    warn!("wred {key}: bad green_max_threshold {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                warn!("wred {key}: green_min_threshold {min} above green_max_threshold {max}, discarding");
                return TaskStatus::InvalidEntry;
            }
        }
        if min.is_some() || max.is_some() {
            attrs.push(WredAttr::GreenEnable(true));
        }
        if let Some(v) = min {
            attrs.push(WredAttr::GreenMinThreshold(v));
        }
        if let Some(v) = max {
            attrs.push(WredAttr::GreenMaxThreshold(v));
        }
        if let Some(value) = update.get_field(FIELD_GREEN_DROP_PROBABILITY) {
            match value.parse::<u32>() {
                Ok(v) if v <= 100 => attrs.push(WredAttr::GreenDropProbability(v)),
                _ => {
                    warn!("wred {key}: bad green_drop_probability {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        if let Some(value) = update.get_field(FIELD_ECN) {
            match parse_ecn_mode(value) {
                Some(mode) => attrs.push(WredAttr::EcnMarkMode(mode)),
                None => {
                    warn!("wred {key}: bad ecn {value:?}, discarding");
                    return TaskStatus::InvalidEntry;
                }
            }
        }
        for (field, _) in &update.fvs {
            if !matches!(
                field.as_str(),
                FIELD_GREEN_MIN_THRESHOLD
                    | FIELD_GREEN_MAX_THRESHOLD
                    | FIELD_GREEN_DROP_PROBABILITY
                    | FIELD_ECN
            ) {
                debug!("wred {key}: skipping unrecognized field {field}");
            }
        }

        if let Some(raw) = self.registry.lookup(WRED_PROFILE_TABLE, key) {
            let wred = WredOid::from_oid(raw);
            for attr in attrs {
                if let Err(e) = self.sai.set_wred_attr(wred, attr) {
                    error!("wred {key}: set {attr:?} failed: {e}");
                    return TaskStatus::Failed;
                }
            }
            return TaskStatus::Success;
        }

        match self.sai.create_wred(&attrs) {
            Ok(wred) => {
                if let Err(e) = self.registry.insert(WRED_PROFILE_TABLE, key, wred.as_oid()) {
                    error!("wred {key}: registry insert failed: {e}");
                }
                let record =
                    AuditRecord::new(AuditCategory::ResourceCreate, "QosOrch", "create_wred")
                        .with_outcome(AuditOutcome::Success)
                        .with_object_id(key)
                        .with_object_type("wred_profile");
                audit_log!(record);
                TaskStatus::Success
            }
            Err(e) => {
                error!("wred {key}: create failed: {e}");
                TaskStatus::Failed
            }
        }
    }

    fn process_queue_binding(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        let (aliases, range) = match parse_bind_key(key) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("queue binding {key}: {e}, discarding");
                return TaskStatus::InvalidEntry;
            }
        };

        // DEL detaches both attachment points; SET applies whichever of
        // the two reference fields are present.
        let (scheduler, wred, del) = if update.op.is_del() {
            (None, None, true)
        } else {
            let scheduler = match resolve_field_ref(&self.registry, FIELD_SCHEDULER, update) {
                Ok(maybe) => maybe.map(SchedulerOid::from_oid),
                Err(err) => return self.ref_error_status(key, FIELD_SCHEDULER, err),
            };
            let wred = match resolve_field_ref(&self.registry, FIELD_WRED_PROFILE, update) {
                Ok(maybe) => maybe.map(WredOid::from_oid),
                Err(err) => return self.ref_error_status(key, FIELD_WRED_PROFILE, err),
            };
            (scheduler, wred, false)
        };

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
            if del || scheduler.is_some() {
                if let Err(e) = self.sai.set_queue_scheduler(queue, scheduler) {
                    error!("queue binding {key}: scheduler apply failed: {e}");
                    let record = AuditRecord::new(
                        AuditCategory::SaiOperation,
                        "QosOrch",
                        "set_queue_scheduler",
                    )
                    .with_object_id(key)
                    .with_object_type("queue_binding")
                    .with_error(e.to_string());
                    audit_log!(record);
                    return TaskStatus::Failed;
                }
            }
            if del || wred.is_some() {
                if let Err(e) = self.sai.set_queue_wred(queue, wred) {
                    error!("queue binding {key}: wred apply failed: {e}");
                    let record =
                        AuditRecord::new(AuditCategory::SaiOperation, "QosOrch", "set_queue_wred")
                            .with_object_id(key)
                            .with_object_type("queue_binding")
                            .with_error(e.to_string());
                    audit_log!(record);
                    return TaskStatus::Failed;
                }
            }
        }
        TaskStatus::Success
    }

    fn process_port_qos_map(&mut self, key: &str, update: &KeyOpFieldsValues) -> TaskStatus {
        let aliases = match parse_name_array(key) {
            Ok(aliases) => aliases,
            Err(e) => {
                warn!("port qos map {key}: {e}, discarding");
                return TaskStatus::InvalidEntry;
            }
        };

        let (dscp_to_tc, tc_to_queue, del) = if update.op.is_del() {
            (None, None, true)
        } else {
            let dscp_to_tc = match resolve_field_ref(&self.registry, FIELD_DSCP_TO_TC_MAP, update) {
                Ok(maybe) => maybe.map(QosMapOid::from_oid),
                Err(err) => return self.ref_error_status(key, FIELD_DSCP_TO_TC_MAP, err),
            };
            let tc_to_queue = match resolve_field_ref(&self.registry, FIELD_TC_TO_QUEUE_MAP, update)
            {
                Ok(maybe) => maybe.map(QosMapOid::from_oid),
                Err(err) => return self.ref_error_status(key, FIELD_TC_TO_QUEUE_MAP, err),
            };
            (dscp_to_tc, tc_to_queue, false)
        };

        let mut ports = Vec::new();
        {
            let topology = lock_topology(&self.ports);
            for alias in &aliases {
                match topology.port_id(alias) {
                    Some(port) => ports.push(port),
                    None => {
                        warn!("port qos map {key}: unknown port {alias}, discarding");
                        return TaskStatus::InvalidEntry;
                    }
                }
            }
        }

        for port in ports {
            if del || dscp_to_tc.is_some() {
                if let Err(e) = self.sai.set_port_qos_map(port, QosMapType::DscpToTc, dscp_to_tc) {
                    error!("port qos map {key}: dscp_to_tc apply failed: {e}");
                    return TaskStatus::Failed;
                }
            }
            if del || tc_to_queue.is_some() {
                if let Err(e) = self
                    .sai
                    .set_port_qos_map(port, QosMapType::TcToQueue, tc_to_queue)
                {
                    error!("port qos map {key}: tc_to_queue apply failed: {e}");
                    return TaskStatus::Failed;
                }
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
impl Orch for QosOrch {
    fn name(&self) -> &str {
        "QosOrch"
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
            debug!("port topology not ready, deferring qos drain");
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
