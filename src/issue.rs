//! The issuance run.
//!
//! An [`Issuer`] drives the whole handshake in order: registration (with
//! terms acceptance when the CA links them), one authorization per CSR
//! domain — solve, acknowledge, poll — and finally the CSR submission that
//! yields the certificate. Each step whitelists the statuses it accepts;
//! anything else aborts the run.

use std::{future::Future, pin::Pin, time::Duration};

use crate::{
    api,
    cert::{self, Csr},
    dir::Directory,
    error::{Error, Result},
    jws::Jwk,
    key::AccountKey,
    req::{expect_status, link_with_rel, replay_nonce_opt, req_expect_header, req_get,
          req_safe_read_body},
    solver::{key_authorization, Solver},
    trans::Transport,
    util::{base64url, read_json},
};

/// Pluggable pause between challenge validation polls.
pub type Sleeper = Box<dyn Fn(Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// One certificate issuance session.
///
/// Owns the account key and the nonce chain seeded by the directory fetch.
/// Domains are authorized strictly in CSR order, one at a time; the first
/// failure aborts the run and the certificate request is never sent.
pub struct Issuer {
    trans: Transport,
    api_directory: api::Directory,
    poll_interval: Duration,
    max_polls: Option<usize>,
    sleeper: Sleeper,
}

impl Issuer {
    /// Create a session from a fetched [`Directory`] and the account
    /// private key PEM.
    pub fn new(directory: Directory, account_key_pem: &str) -> Result<Issuer> {
        let key = AccountKey::from_pem(account_key_pem)?;

        Ok(Issuer {
            trans: Transport::new(key, directory.first_nonce),
            api_directory: directory.api_directory,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            sleeper: Box::new(|delay| Box::pin(tokio::time::sleep(delay))),
        })
    }

    /// Pause between challenge validation polls. Defaults to 60 seconds.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Cap the validation polls per challenge. Unlimited when unset.
    pub fn max_polls(mut self, polls: usize) -> Self {
        self.max_polls = Some(polls);
        self
    }

    /// Replace the pause implementation, e.g. with a no-op in tests.
    pub fn sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run the issuance handshake for `csr_pem` and return the issued
    /// certificate as PEM.
    pub async fn issue(mut self, csr_pem: &str, solver: &dyn Solver) -> Result<String> {
        let csr = Csr::from_pem(csr_pem)?;
        let domains = csr.domains()?;

        self.register().await?;

        for domain in &domains {
            self.authorize(domain, solver).await?;
        }

        self.request_certificate(&csr).await
    }

    /// POST `new-reg`, accepting the terms of service when the CA links
    /// them.
    ///
    /// 409 means the account already exists; the CA sends no `Location`
    /// then, so there is nothing to accept and the run proceeds.
    async fn register(&mut self) -> Result<()> {
        let url = self.api_directory.new_reg.clone();

        let res = self.trans.call(&url, &api::Registration::new()).await?;
        let res = expect_status("new-reg", res, &[201, 409]).await?;

        if res.status().as_u16() == 409 {
            log::debug!("account already registered");
            return Ok(());
        }

        let Some(terms_uri) = link_with_rel(res.headers(), "terms-of-service") else {
            log::debug!("registered; no terms of service offered");
            return Ok(());
        };

        let account_url = req_expect_header(&res, "location")?;
        log::info!("accepting terms of service: {terms_uri}");

        let res = self.trans.call(&account_url, &api::Agreement::new(terms_uri)).await?;
        expect_status("reg", res, &[202, 409]).await?;

        Ok(())
    }

    /// Authorize one domain: `new-authz`, solve, acknowledge, poll until
    /// valid.
    async fn authorize(&mut self, domain: &str, solver: &dyn Solver) -> Result<()> {
        log::info!("authorizing {domain}");

        let url = self.api_directory.new_authz.clone();

        let res = self.trans.call(&url, &api::NewAuthz::dns(domain)).await?;
        let res = expect_status("new-authz", res, &[201]).await?;
        let authz = read_json::<api::Authorization>(res).await?;

        let challenge = authz
            .challenges
            .iter()
            .find(|challenge| solver.select(challenge))
            .ok_or_else(|| Error::NoSupportedChallenge {
                solver: solver.name().to_owned(),
            })?;

        let token = challenge
            .token
            .clone()
            .ok_or_else(|| Error::MalformedJson("challenge lacks a token".to_owned()))?;
        let challenge_url = challenge
            .uri
            .clone()
            .ok_or_else(|| Error::MalformedJson("challenge lacks a uri".to_owned()))?;

        let thumbprint = Jwk::from(self.trans.key()).thumbprint()?;
        let key_auth = key_authorization(&token, &thumbprint);

        solver
            .solve(domain, &token, &key_auth)
            .map_err(|err| Error::SolverFailed(err.to_string()))?;

        let ack = api::ChallengeAck::new(solver.name(), &key_auth);
        let res = self.trans.call(&challenge_url, &ack).await?;

        // Any 2xx acknowledges; the body is not inspected.
        if !res.status().is_success() {
            let code = res.status().as_u16();
            let body = req_safe_read_body(res).await;
            return Err(Error::UnexpectedStatus {
                endpoint: "challenge",
                code,
                body,
            });
        }

        self.poll_challenge(domain, &challenge_url).await
    }

    /// GET the challenge until its status leaves `pending`.
    ///
    /// A missing status counts as `pending`; anything other than `pending`
    /// or `valid` fails the domain.
    async fn poll_challenge(&mut self, domain: &str, url: &str) -> Result<()> {
        let mut polls = 0;

        loop {
            let res = req_get(url).await?;

            // The CA stamps plain GETs too; keep the chain current.
            if let Some(nonce) = replay_nonce_opt(res.headers()) {
                self.trans.refresh_nonce(nonce);
            }

            let state = read_json::<api::ChallengeState>(res).await?;

            match state.status.as_deref() {
                Some("valid") => {
                    log::info!("{domain} authorized");
                    return Ok(());
                }
                None | Some("pending") => {}
                Some(other) => {
                    return Err(Error::ChallengeRejected {
                        domain: domain.to_owned(),
                        status: other.to_owned(),
                    });
                }
            }

            polls += 1;
            if let Some(max) = self.max_polls {
                if polls >= max {
                    return Err(Error::PollTimeout {
                        domain: domain.to_owned(),
                        polls,
                    });
                }
            }

            log::debug!("{domain} still pending, sleeping {:?}", self.poll_interval);
            (self.sleeper)(self.poll_interval).await;
        }
    }

    /// Submit the CSR and decode the returned DER certificate.
    ///
    /// Only reached once every domain has polled `valid`.
    async fn request_certificate(&mut self, csr: &Csr) -> Result<String> {
        log::info!("requesting certificate");

        let url = self.api_directory.new_cert.clone();
        let payload = api::NewCert::new(base64url(&csr.to_der()?));

        let res = self.trans.call(&url, &payload).await?;
        let res = expect_status("new-cert", res, &[201]).await?;

        let der = res.bytes().await?;
        cert::pem_from_der(&der)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use super::*;
    use crate::{
        solver::SolveResult,
        test::{
            with_acme_server, Scenario, ACCOUNT_KEY_PEM, ACCOUNT_KEY_THUMBPRINT, MULTI_CSR_PEM,
            SINGLE_CSR_PEM,
        },
        DirectoryUrl,
    };

    /// Solver that publishes nothing and records the key authorizations it
    /// was asked for.
    struct AutoSolver {
        name: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl AutoSolver {
        fn new(name: &'static str) -> AutoSolver {
            AutoSolver {
                name,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Solver for AutoSolver {
        fn name(&self) -> &str {
            self.name
        }

        fn solve(&self, _domain: &str, _token: &str, key_authorization: &str) -> SolveResult {
            self.seen.lock().unwrap().push(key_authorization.to_owned());
            Ok(())
        }
    }

    /// Solver whose side effect always fails.
    struct BrokenSolver;

    impl Solver for BrokenSolver {
        fn name(&self) -> &str {
            "http-01"
        }

        fn solve(&self, _domain: &str, _token: &str, _ka: &str) -> SolveResult {
            Err("webroot is not writable".into())
        }
    }

    async fn issuer_for(server_url: &str) -> Issuer {
        let dir = Directory::fetch(DirectoryUrl::Other(server_url)).await.unwrap();
        Issuer::new(dir, ACCOUNT_KEY_PEM)
            .unwrap()
            .poll_interval(Duration::from_millis(1))
    }

    fn counting_sleeper(count: &Arc<AtomicUsize>) -> Sleeper {
        let count = Arc::clone(count);
        Box::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Box::pin(std::future::ready(()))
        })
    }

    #[tokio::test]
    async fn happy_path_single_domain_http01() {
        let server = with_acme_server(Scenario::Happy);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        let pem = issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap();

        assert_eq!(pem.matches("-----BEGIN CERTIFICATE-----").count(), 1);
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 1);

        // the solver saw exactly the key authorization for our account key
        let seen = solver.seen.lock().unwrap();
        assert_eq!(*seen, [format!("tok-http.{ACCOUNT_KEY_THUMBPRINT}")]);
    }

    #[tokio::test]
    async fn existing_account_skips_terms() {
        let server = with_acme_server(Scenario::ExistingAccount);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap();

        assert_eq!(server.state.agreement_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_nonce_is_fatal() {
        let server = with_acme_server(Scenario::MissingNonce);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        let err = issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap_err();

        assert!(matches!(err, Error::NoNonce));
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_challenges() {
        let server = with_acme_server(Scenario::UnsupportedChallenge);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        let err = issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap_err();

        assert!(matches!(err, Error::NoSupportedChallenge { solver } if solver == "http-01"));
    }

    #[tokio::test]
    async fn polls_pending_then_valid() {
        let server = with_acme_server(Scenario::PendingThenValid);
        let solver = AutoSolver::new("http-01");

        let sleeps = Arc::new(AtomicUsize::new(0));
        let issuer = issuer_for(&server.dir_url).await.sleeper(counting_sleeper(&sleeps));

        issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap();

        // two pending responses, so exactly two pauses before valid
        assert_eq!(sleeps.load(Ordering::SeqCst), 2);
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn poll_cap_is_enforced() {
        let server = with_acme_server(Scenario::AlwaysPending);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await.max_polls(3);
        let err = issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap_err();

        assert!(matches!(err, Error::PollTimeout { polls: 3, .. }));
    }

    #[tokio::test]
    async fn rejected_challenge_fails_the_domain() {
        let server = with_acme_server(Scenario::ChallengeInvalid);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        let err = issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap_err();

        assert!(matches!(
            err,
            Error::ChallengeRejected { domain, status } if domain == "example.com" && status == "invalid"
        ));
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_domain_failure_prevents_issuance() {
        let server = with_acme_server(Scenario::SecondAuthzFails);
        let solver = AutoSolver::new("http-01");

        let issuer = issuer_for(&server.dir_url).await;
        let err = issuer.issue(MULTI_CSR_PEM, &solver).await.unwrap_err();

        assert!(matches!(
            err,
            Error::UnexpectedStatus {
                endpoint: "new-authz",
                code: 500,
                ..
            }
        ));

        // the first domain was fully processed, the second aborted the run
        assert_eq!(server.state.authz_calls.load(Ordering::SeqCst), 2);
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn solver_failure_aborts() {
        let server = with_acme_server(Scenario::Happy);

        let issuer = issuer_for(&server.dir_url).await;
        let err = issuer.issue(SINGLE_CSR_PEM, &BrokenSolver).await.unwrap_err();

        assert!(matches!(err, Error::SolverFailed(reason) if reason.contains("webroot")));
        assert_eq!(server.state.new_cert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dns_solver_selects_dns_challenge() {
        let server = with_acme_server(Scenario::Happy);
        let solver = AutoSolver::new("dns-01");

        let issuer = issuer_for(&server.dir_url).await;
        issuer.issue(SINGLE_CSR_PEM, &solver).await.unwrap();

        let seen = solver.seen.lock().unwrap();
        assert_eq!(*seen, [format!("tok-dns.{ACCOUNT_KEY_THUMBPRINT}")]);
    }
}
