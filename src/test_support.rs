//! Fixtures shared by unit tests: sample requests and scripted transports.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::domain::*;
use crate::infrastructure::http::{
    HttpRequest, HttpResponse, HttpTransport, TransportError, TransportResult,
};

type Script = dyn Fn(&HttpRequest) -> TransportResult<HttpResponse> + Send + Sync;

/// Answers every POST through a script and records what was sent.
pub struct ScriptedTransport {
    script: Box<Script>,
    delay: Option<Duration>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl Fn(&HttpRequest) -> TransportResult<HttpResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay: None,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(status: u16, body: impl Into<String>) -> Arc<Self> {
        let body = body.into();
        Self::new(move |_| Ok(HttpResponse::new(status, body.clone())))
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Self::new(move |_| Err(error.clone()))
    }

    /// Never answers within any reasonable test timeout.
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(|_: &HttpRequest| Ok(HttpResponse::new(200, ""))),
            delay: Some(Duration::from_secs(3600)),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        self.sent.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(&request)
    }
}

pub fn operator() -> OperatorId {
    OperatorId::parse("DE*GEF").unwrap()
}

pub fn provider() -> ProviderId {
    ProviderId::parse("DE-ICE").unwrap()
}

pub fn evse(text: &str) -> EvseId {
    EvseId::parse(text).unwrap()
}

pub fn rfid() -> Identification {
    Identification::RfidMifareFamily(Uid::parse("AABBCCDD").unwrap())
}

pub fn contract() -> Identification {
    Identification::Remote(EvcoId::parse("DE*ICE*ETU6T5*X").unwrap())
}

pub fn data_record(evse_id: &str) -> EvseDataRecord {
    let address = Address {
        country: "DEU".into(),
        city: "Jena".into(),
        street: "Hauptstr.".into(),
        postal_code: Some("07743".into()),
        house_number: Some("1".into()),
        ..Address::default()
    };
    let mut record = EvseDataRecord::new(evse(evse_id), address, GeoCoordinates::new(50.9279, 11.5892));
    record.plugs = vec![Plug::Type2Outlet];
    record
}

pub fn push_evse_data() -> PushEvseDataRequest {
    PushEvseDataRequest::new(
        ActionType::FullLoad,
        operator(),
        vec![data_record("DE*GEF*E1*1"), data_record("DE*GEF*E1*2")],
    )
}

pub fn push_evse_status() -> PushEvseStatusRequest {
    PushEvseStatusRequest::new(
        ActionType::Update,
        operator(),
        vec![EvseStatusRecord::new(evse("DE*GEF*E1*1"), EvseStatus::Occupied)],
    )
}

pub fn authorize_start() -> AuthorizeStartRequest {
    AuthorizeStartRequest::new(operator(), rfid()).with_evse(evse("DE*GEF*E1*1"))
}

pub fn authorize_stop() -> AuthorizeStopRequest {
    AuthorizeStopRequest::new(operator(), SessionId::new_random(), rfid())
}

pub fn charge_detail_record() -> ChargeDetailRecord {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
    ChargeDetailRecord::new(
        SessionId::new_random(),
        evse("DE*GEF*E1*1"),
        rfid(),
        start,
        start + chrono::Duration::minutes(45),
    )
}

pub fn remote_start() -> AuthorizeRemoteStartRequest {
    AuthorizeRemoteStartRequest::new(provider(), evse("DE*GEF*E1*1"), contract())
}

pub fn remote_stop() -> AuthorizeRemoteStopRequest {
    AuthorizeRemoteStopRequest::new(SessionId::new_random(), provider(), evse("DE*GEF*E1*1"))
}

pub fn reservation_start() -> AuthorizeRemoteReservationStartRequest {
    AuthorizeRemoteReservationStartRequest::new(provider(), evse("DE*GEF*E1*1"), contract())
}

pub fn reservation_stop() -> AuthorizeRemoteReservationStopRequest {
    AuthorizeRemoteReservationStopRequest::new(SessionId::new_random(), provider(), evse("DE*GEF*E1*1"))
}
