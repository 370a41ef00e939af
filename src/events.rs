//! Typed campaign lifecycle events
//!
//! Callers register callbacks per event; each event carries the concrete
//! record it relates to. A failing callback is error-logged at the call
//! site and never interrupts the campaign.

use crate::common::Result;
use crate::results::{CampaignExecution, TestCaseExecution, TestError, TestSuiteExecution};

/// Campaign lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignEvent {
    /// The campaign is about to start.
    BeforeCampaign,
    /// The campaign has finished, reports written.
    AfterCampaign,
    /// A test suite is about to start.
    BeforeTestSuite,
    /// A test suite has finished.
    AfterTestSuite,
    /// A test case is about to start.
    BeforeTestCase,
    /// A test case has finished.
    AfterTestCase,
    /// A test error was collected for a finished case.
    Error,
}

impl std::fmt::Display for CampaignEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CampaignEvent::BeforeCampaign => "before-campaign",
            CampaignEvent::AfterCampaign => "after-campaign",
            CampaignEvent::BeforeTestSuite => "before-test-suite",
            CampaignEvent::AfterTestSuite => "after-test-suite",
            CampaignEvent::BeforeTestCase => "before-test-case",
            CampaignEvent::AfterTestCase => "after-test-case",
            CampaignEvent::Error => "error",
        };
        f.write_str(name)
    }
}

/// Callback receiving the campaign record.
pub type CampaignHook = Box<dyn FnMut(&CampaignExecution) -> Result<()> + Send>;
/// Callback receiving a test suite record.
pub type SuiteHook = Box<dyn FnMut(&TestSuiteExecution) -> Result<()> + Send>;
/// Callback receiving a test case record.
pub type CaseHook = Box<dyn FnMut(&TestCaseExecution) -> Result<()> + Send>;
/// Callback receiving a collected test error.
pub type ErrorHook = Box<dyn FnMut(&TestError) -> Result<()> + Send>;

/// Per-event callback lists.
#[derive(Default)]
pub struct CampaignHooks {
    before_campaign: Vec<CampaignHook>,
    after_campaign: Vec<CampaignHook>,
    before_test_suite: Vec<SuiteHook>,
    after_test_suite: Vec<SuiteHook>,
    before_test_case: Vec<CaseHook>,
    after_test_case: Vec<CaseHook>,
    error: Vec<ErrorHook>,
}

impl CampaignHooks {
    /// Register a before-campaign callback.
    pub fn on_before_campaign(&mut self, hook: CampaignHook) {
        self.before_campaign.push(hook);
    }

    /// Register an after-campaign callback.
    pub fn on_after_campaign(&mut self, hook: CampaignHook) {
        self.after_campaign.push(hook);
    }

    /// Register a before-test-suite callback.
    pub fn on_before_test_suite(&mut self, hook: SuiteHook) {
        self.before_test_suite.push(hook);
    }

    /// Register an after-test-suite callback.
    pub fn on_after_test_suite(&mut self, hook: SuiteHook) {
        self.after_test_suite.push(hook);
    }

    /// Register a before-test-case callback.
    pub fn on_before_test_case(&mut self, hook: CaseHook) {
        self.before_test_case.push(hook);
    }

    /// Register an after-test-case callback.
    pub fn on_after_test_case(&mut self, hook: CaseHook) {
        self.after_test_case.push(hook);
    }

    /// Register an error callback.
    pub fn on_error(&mut self, hook: ErrorHook) {
        self.error.push(hook);
    }

    pub(crate) fn emit_campaign(&mut self, event: CampaignEvent, campaign: &CampaignExecution) {
        let hooks = match event {
            CampaignEvent::BeforeCampaign => &mut self.before_campaign,
            CampaignEvent::AfterCampaign => &mut self.after_campaign,
            _ => return,
        };
        for hook in hooks {
            if let Err(err) = hook(campaign) {
                tracing::error!("{} hook failed: {}", event, err);
            }
        }
    }

    pub(crate) fn emit_test_suite(&mut self, event: CampaignEvent, suite: &TestSuiteExecution) {
        let hooks = match event {
            CampaignEvent::BeforeTestSuite => &mut self.before_test_suite,
            CampaignEvent::AfterTestSuite => &mut self.after_test_suite,
            _ => return,
        };
        for hook in hooks {
            if let Err(err) = hook(suite) {
                tracing::error!("{} hook failed: {}", event, err);
            }
        }
    }

    pub(crate) fn emit_test_case(&mut self, event: CampaignEvent, case: &TestCaseExecution) {
        let hooks = match event {
            CampaignEvent::BeforeTestCase => &mut self.before_test_case,
            CampaignEvent::AfterTestCase => &mut self.after_test_case,
            _ => return,
        };
        for hook in hooks {
            if let Err(err) = hook(case) {
                tracing::error!("{} hook failed: {}", event, err);
            }
        }
    }

    pub(crate) fn emit_error(&mut self, error: &TestError) {
        for hook in &mut self.error {
            if let Err(err) = hook(error) {
                tracing::error!("{} hook failed: {}", CampaignEvent::Error, err);
            }
        }
    }
}
