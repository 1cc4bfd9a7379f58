use super::paginate;
use crate::domain::loan::{Loan, LoanState};
use crate::domain::ports::LoanStore;
use crate::error::StoreError;
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Column Family for storing loan records.
pub const CF_LOANS: &str = "loans";

/// A persistent loan store backed by RocksDB.
///
/// Loans are stored as JSON under their id in the `loans` column family.
/// `save` and `update` run their existence check and write under a single
/// mutex so concurrent writers cannot interleave between the two.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLoanStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn backend<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(Box::new(err))
}

impl RocksDbLoanStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the `loans` column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_loans = ColumnFamilyDescriptor::new(CF_LOANS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_loans]).map_err(backend)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: &str) -> Result<Option<Loan>, StoreError> {
        let cf = self.cf()?;
        match self.db.get_cf(&cf, id.as_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(backend)?)),
            None => Ok(None),
        }
    }

    fn write(&self, loan: &Loan) -> Result<(), StoreError> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(loan).map_err(backend)?;
        self.db
            .put_cf(&cf, loan.id.as_bytes(), value)
            .map_err(backend)
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db.cf_handle(CF_LOANS).ok_or_else(|| {
            StoreError::Backend(Box::new(std::io::Error::other(
                "Loans column family not found",
            )))
        })
    }

    fn scan(&self, pred: impl Fn(&Loan) -> bool) -> Result<Vec<Loan>, StoreError> {
        let cf = self.cf()?;
        let mut loans = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(backend)?;
            let loan: Loan = serde_json::from_slice(&value).map_err(backend)?;
            if pred(&loan) {
                loans.push(loan);
            }
        }
        Ok(loans)
    }
}

#[async_trait]
impl LoanStore for RocksDbLoanStore {
    async fn save(&self, loan: Loan) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.read(&loan.id)?.is_some() {
            return Err(StoreError::AlreadyExists(loan.id));
        }
        debug!(loan_id = %loan.id, "saving loan to rocksdb");
        self.write(&loan)
    }

    async fn find_by_id(&self, id: &str) -> Result<Loan, StoreError> {
        self.read(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, loan: Loan) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.read(&loan.id)?.is_none() {
            return Err(StoreError::NotFound(loan.id));
        }
        debug!(loan_id = %loan.id, state = %loan.state, "updating loan in rocksdb");
        self.write(&loan)
    }

    async fn find_by_borrower_id(&self, borrower_id: &str) -> Result<Vec<Loan>, StoreError> {
        self.scan(|loan| loan.borrower_id == borrower_id)
    }

    async fn find_by_state(&self, state: LoanState) -> Result<Vec<Loan>, StoreError> {
        self.scan(|loan| loan.state == state)
    }

    async fn find_all(&self, page: usize, limit: usize) -> Result<Vec<Loan>, StoreError> {
        Ok(paginate(self.scan(|_| true)?, page, limit))
    }
}
