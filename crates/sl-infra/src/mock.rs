//! Recording in-memory guest service for testing.
//!
//! Scripts how many transactions each poll sees and when the public address
//! shows up, and records every remote call in order so tests can assert on
//! the exact sequence the orchestrator issued.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use softlayer_api::{
    Datacenter, NetworkComponent, StatusCode, Transaction, VirtualGuest, VirtualGuestTemplate,
};

use crate::VirtualGuestService;
use crate::types::GuestId;

pub(crate) const GUEST_ID: i64 = 4242;
pub(crate) const PUBLIC_IP: &str = "169.45.1.10";
pub(crate) const PRIVATE_IP: &str = "10.120.4.7";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(VirtualGuestTemplate),
    Get(GuestId),
    Edit(GuestId, VirtualGuest),
    Delete(GuestId),
    ActiveTransactions(GuestId),
    SetTags(GuestId, Vec<String>),
}

/// Which remote call should fail, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Create,
    GetNotFound,
    GetServerError,
    Transactions,
    SetTags,
    Edit,
    Delete,
    /// Edit and delete are accepted but answered with `false`.
    Declined,
}

pub(crate) struct MockService {
    calls: Mutex<Vec<Call>>,
    /// Active transaction counts, one per poll; an exhausted script means idle.
    transactions: Mutex<VecDeque<usize>>,
    /// Number of reads that still see no public address.
    reads_without_address: Mutex<usize>,
    guest: Mutex<VirtualGuest>,
    fault: Option<Fault>,
}

impl MockService {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            transactions: Mutex::new(VecDeque::new()),
            reads_without_address: Mutex::new(0),
            guest: Mutex::new(VirtualGuest {
                id: GUEST_ID,
                hostname: "web01".into(),
                domain: "example.com".into(),
                start_cpus: 1,
                max_memory: 1024,
                datacenter: Some(Datacenter {
                    name: "ams01".into(),
                }),
                network_components: vec![NetworkComponent { max_speed: 1000 }],
                primary_ip_address: PUBLIC_IP.into(),
                primary_backend_ip_address: PRIVATE_IP.into(),
                user_data: vec![],
            }),
            fault: None,
        }
    }

    pub(crate) fn with_transactions(self, counts: &[usize]) -> Self {
        *self.transactions.lock().unwrap() = counts.iter().copied().collect();
        self
    }

    pub(crate) fn with_reads_without_address(self, reads: usize) -> Self {
        *self.reads_without_address.lock().unwrap() = reads;
        self
    }

    /// The public address never shows up.
    pub(crate) fn without_public_address(self) -> Self {
        self.with_reads_without_address(usize::MAX)
    }

    pub(crate) fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn fails(&self, fault: Fault) -> bool {
        self.fault == Some(fault)
    }

    fn api_error(endpoint: &'static str, status: StatusCode) -> softlayer_api::Error {
        softlayer_api::Error::Api {
            endpoint,
            status,
            body: format!("{endpoint} refused"),
        }
    }
}

#[async_trait]
impl VirtualGuestService for MockService {
    async fn create_object(
        &self,
        template: &VirtualGuestTemplate,
    ) -> softlayer_api::Result<VirtualGuest> {
        self.record(Call::Create(template.clone()));
        if self.fails(Fault::Create) {
            return Err(Self::api_error("create guest", StatusCode::BAD_REQUEST));
        }

        let mut guest = self.guest.lock().unwrap().clone();
        guest.primary_ip_address = String::new();
        Ok(guest)
    }

    async fn get_object(&self, id: GuestId) -> softlayer_api::Result<VirtualGuest> {
        self.record(Call::Get(id));
        if self.fails(Fault::GetNotFound) {
            return Err(Self::api_error("get guest", StatusCode::NOT_FOUND));
        }
        if self.fails(Fault::GetServerError) {
            return Err(Self::api_error(
                "get guest",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }

        let mut guest = self.guest.lock().unwrap().clone();
        let mut pending = self.reads_without_address.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            guest.primary_ip_address = String::new();
        }
        Ok(guest)
    }

    async fn edit_object(&self, id: GuestId, guest: &VirtualGuest) -> softlayer_api::Result<bool> {
        self.record(Call::Edit(id, guest.clone()));
        if self.fails(Fault::Edit) {
            return Err(Self::api_error("edit guest", StatusCode::BAD_REQUEST));
        }
        *self.guest.lock().unwrap() = guest.clone();
        Ok(!self.fails(Fault::Declined))
    }

    async fn delete_object(&self, id: GuestId) -> softlayer_api::Result<bool> {
        self.record(Call::Delete(id));
        if self.fails(Fault::Delete) {
            return Err(Self::api_error("delete guest", StatusCode::CONFLICT));
        }
        Ok(!self.fails(Fault::Declined))
    }

    async fn get_active_transactions(
        &self,
        id: GuestId,
    ) -> softlayer_api::Result<Vec<Transaction>> {
        self.record(Call::ActiveTransactions(id));
        if self.fails(Fault::Transactions) {
            return Err(Self::api_error(
                "get active transactions",
                StatusCode::SERVICE_UNAVAILABLE,
            ));
        }

        let count = self.transactions.lock().unwrap().pop_front().unwrap_or(0);
        Ok((0..count)
            .map(|i| Transaction {
                id: i as i64,
                create_date: None,
                transaction_status: None,
            })
            .collect())
    }

    async fn set_tags(&self, id: GuestId, tags: &[String]) -> softlayer_api::Result<bool> {
        self.record(Call::SetTags(id, tags.to_vec()));
        if self.fails(Fault::SetTags) {
            return Err(Self::api_error("set tags", StatusCode::FORBIDDEN));
        }
        Ok(true)
    }
}
