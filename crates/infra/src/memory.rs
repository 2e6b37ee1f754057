//! In-memory hospital store for tests/dev.
//!
//! Holds stays, medical acts, staff, investments and alerts behind a single
//! `RwLock` and answers every forecasting provider query by scanning them.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use careforecast_core::{DomainError, DomainResult, HistoricalWindow, MetricKind, ServiceName};
use careforecast_forecasting::{
    AlertProvider, CapacitySnapshotProvider, HistoricalAggregator, InvestmentProvider, ProviderError,
    ProviderResult, StaffingProvider, DEFAULT_SERVICES,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StayId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AlertId(u64);

#[derive(Debug, Clone)]
struct StayRecord {
    id: StayId,
    patient_id: u64,
    service: ServiceName,
    admitted_at: NaiveDateTime,
    discharged_at: Option<NaiveDateTime>,
    total_cost: Option<f64>,
}

impl StayRecord {
    /// Fraction of days this stay occupied a bed within `[start, end)`.
    fn bed_days_within(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        let from = self.admitted_at.max(start);
        let to = self.discharged_at.unwrap_or(end).min(end);
        if to <= from {
            return 0.0;
        }
        (to - from).num_seconds() as f64 / SECONDS_PER_DAY
    }
}

#[derive(Debug, Clone)]
struct ActRecord {
    stay: StayId,
    performed_at: NaiveDateTime,
    tariff: f64,
}

#[derive(Debug, Clone)]
struct StaffRecord {
    service: ServiceName,
    active: bool,
}

#[derive(Debug, Clone)]
struct InvestmentRecord {
    service: ServiceName,
    amount: f64,
    invested_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct AlertRecord {
    id: AlertId,
    service: ServiceName,
    resolved: bool,
}

#[derive(Debug, Default)]
struct HospitalData {
    next_id: u64,
    stays: Vec<StayRecord>,
    acts: Vec<ActRecord>,
    staff: Vec<StaffRecord>,
    investments: Vec<InvestmentRecord>,
    alerts: Vec<AlertRecord>,
}

impl HospitalData {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn stays_of<'a>(&'a self, service: &'a ServiceName) -> impl Iterator<Item = &'a StayRecord> + 'a {
        self.stays.iter().filter(move |s| &s.service == service)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHospitalStore {
    inner: RwLock<HospitalData>,
}

impl InMemoryHospitalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ProviderResult<RwLockReadGuard<'_, HospitalData>> {
        self.inner
            .read()
            .map_err(|_| ProviderError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> RwLockWriteGuard<'_, HospitalData> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn admit(&self, service: &ServiceName, patient_id: u64, admitted_at: NaiveDateTime) -> StayId {
        let mut data = self.write();
        let id = StayId(data.next_id());
        data.stays.push(StayRecord {
            id,
            patient_id,
            service: service.clone(),
            admitted_at,
            discharged_at: None,
            total_cost: None,
        });
        id
    }

    pub fn discharge(&self, stay: StayId, at: NaiveDateTime, total_cost: Option<f64>) -> DomainResult<()> {
        let mut data = self.write();
        let record = data
            .stays
            .iter_mut()
            .find(|s| s.id == stay)
            .ok_or_else(|| DomainError::not_found(format!("stay {} not found", stay.0)))?;
        if at < record.admitted_at {
            return Err(DomainError::validation("discharge precedes admission"));
        }
        record.discharged_at = Some(at);
        record.total_cost = total_cost;
        Ok(())
    }

    pub fn record_act(&self, stay: StayId, performed_at: NaiveDateTime, tariff: f64) -> DomainResult<()> {
        let mut data = self.write();
        if !data.stays.iter().any(|s| s.id == stay) {
            return Err(DomainError::not_found(format!("stay {} not found", stay.0)));
        }
        data.acts.push(ActRecord {
            stay,
            performed_at,
            tariff,
        });
        Ok(())
    }

    pub fn add_staff(&self, service: &ServiceName, active: bool) {
        self.write().staff.push(StaffRecord {
            service: service.clone(),
            active,
        });
    }

    pub fn record_investment(&self, service: &ServiceName, amount: f64, invested_at: NaiveDateTime) {
        self.write().investments.push(InvestmentRecord {
            service: service.clone(),
            amount,
            invested_at,
        });
    }

    pub fn raise_alert(&self, service: &ServiceName) -> AlertId {
        let mut data = self.write();
        let id = AlertId(data.next_id());
        data.alerts.push(AlertRecord {
            id,
            service: service.clone(),
            resolved: false,
        });
        id
    }

    pub fn resolve_alert(&self, alert: AlertId) -> DomainResult<()> {
        let mut data = self.write();
        let record = data
            .alerts
            .iter_mut()
            .find(|a| a.id == alert)
            .ok_or_else(|| DomainError::not_found(format!("alert {} not found", alert.0)))?;
        record.resolved = true;
        Ok(())
    }

    /// Deterministic sample activity for the default services over the
    /// `history_days` preceding `today`.
    pub fn with_demo_data(today: NaiveDate, history_days: u32) -> Self {
        let store = Self::new();
        let mut patient_id = 0u64;
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);

        for (k, name) in DEFAULT_SERVICES.iter().enumerate() {
            let Ok(service) = ServiceName::new(name) else { continue };
            let k = k as u64;
            let tariff = 800.0 + 150.0 * k as f64;

            for back in (1..=u64::from(history_days)).rev() {
                let day = today - Duration::days(back as i64);
                let admissions = 2 + (back + k) % 3;
                for n in 0..admissions {
                    patient_id += 1;
                    let admitted_at = midnight(day) + Duration::hours(8 + n as i64);
                    let stay = store.admit(&service, patient_id, admitted_at);
                    let length = 1 + (back + n) % 4;
                    let _ = store.record_act(stay, admitted_at + Duration::hours(2), tariff);

                    let discharged_at = admitted_at + Duration::days(length as i64);
                    if discharged_at.date() < today {
                        let _ = store.discharge(stay, discharged_at, Some(tariff * length as f64));
                    }
                }
            }

            for n in 0..(3 + k) {
                store.add_staff(&service, n % 5 != 4);
            }
            if k % 2 == 0 {
                store.record_investment(&service, 50_000.0 * (k + 1) as f64, midnight(today - Duration::days(20)));
            }
            for _ in 0..(k % 3) {
                store.raise_alert(&service);
            }
        }
        store
    }
}

#[async_trait]
impl HistoricalAggregator for InMemoryHospitalStore {
    async fn total(&self, window: &HistoricalWindow) -> ProviderResult<Option<f64>> {
        let data = self.read()?;
        let (service, start, end) = (window.service(), window.start(), window.end());

        let total = match window.metric() {
            MetricKind::Cost => {
                let stays: HashSet<StayId> = data.stays_of(service).map(|s| s.id).collect();
                let tariffs: Vec<f64> = data
                    .acts
                    .iter()
                    .filter(|a| stays.contains(&a.stay) && a.performed_at >= start && a.performed_at < end)
                    .map(|a| a.tariff)
                    .collect();
                (!tariffs.is_empty()).then(|| tariffs.iter().sum())
            }
            MetricKind::Patients => {
                let patients: HashSet<u64> = data
                    .stays_of(service)
                    .filter(|s| s.admitted_at >= start && s.admitted_at < end)
                    .map(|s| s.patient_id)
                    .collect();
                (!patients.is_empty()).then(|| patients.len() as f64)
            }
            MetricKind::Occupancy => {
                let bed_days: f64 = data.stays_of(service).map(|s| s.bed_days_within(start, end)).sum();
                (bed_days > 0.0).then_some(bed_days)
            }
        };
        Ok(total)
    }
}

#[async_trait]
impl CapacitySnapshotProvider for InMemoryHospitalStore {
    async fn active_stays(&self, service: &ServiceName) -> ProviderResult<u64> {
        let data = self.read()?;
        Ok(data.stays_of(service).filter(|s| s.discharged_at.is_none()).count() as u64)
    }

    async fn distinct_patients(&self, service: &ServiceName) -> ProviderResult<u64> {
        let data = self.read()?;
        let patients: HashSet<u64> = data.stays_of(service).map(|s| s.patient_id).collect();
        Ok(patients.len() as u64)
    }

    async fn average_stay_cost(&self, service: &ServiceName) -> ProviderResult<Option<f64>> {
        let data = self.read()?;
        let costs: Vec<f64> = data.stays_of(service).map(|s| s.total_cost.unwrap_or(0.0)).collect();
        if costs.is_empty() {
            return Ok(None);
        }
        Ok(Some(costs.iter().sum::<f64>() / costs.len() as f64))
    }
}

#[async_trait]
impl StaffingProvider for InMemoryHospitalStore {
    async fn active_count(&self, service: &ServiceName) -> ProviderResult<u64> {
        let data = self.read()?;
        Ok(data.staff.iter().filter(|s| &s.service == service && s.active).count() as u64)
    }
}

#[async_trait]
impl InvestmentProvider for InMemoryHospitalStore {
    async fn recent_investments(&self, service: &ServiceName, since: NaiveDateTime) -> ProviderResult<Vec<f64>> {
        let data = self.read()?;
        Ok(data
            .investments
            .iter()
            .filter(|i| &i.service == service && i.invested_at >= since)
            .map(|i| i.amount)
            .collect())
    }
}

#[async_trait]
impl AlertProvider for InMemoryHospitalStore {
    async fn open_alert_count(&self, service: &ServiceName) -> ProviderResult<u64> {
        let data = self.read()?;
        Ok(data.alerts.iter().filter(|a| &a.service == service && !a.resolved).count() as u64)
    }
}
