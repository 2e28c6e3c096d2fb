//! UI(main) 컨텍스트 전달 큐
//!
//! 저장 완료 콜백처럼 UI 상태를 건드릴 수 있는 작업은 어느 스레드에서 완료되었든
//! 이 큐에 올라가고, UI를 소유한 쪽이 `MainQueueRunner`로 꺼내 실행합니다.
//! 작업은 게시된 순서대로 실행됩니다.

use tokio::sync::mpsc;
use tracing::warn;

/// main 컨텍스트에서 실행될 작업
pub type MainJob = Box<dyn FnOnce() + Send + 'static>;

/// 작업 게시용 핸들 (복제 가능)
#[derive(Clone)]
pub struct MainQueue {
    tx: mpsc::UnboundedSender<MainJob>,
}

/// UI 소유자가 보관하는 실행기
pub struct MainQueueRunner {
    rx: mpsc::UnboundedReceiver<MainJob>,
}

/// 큐 / 실행기 쌍 생성
pub fn main_queue() -> (MainQueue, MainQueueRunner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainQueue { tx }, MainQueueRunner { rx })
}

impl MainQueue {
    /// 작업 게시. 실행기가 이미 사라졌으면 false.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(job)).is_err() {
            warn!("[MainQueue] Runner dropped, job discarded");
            return false;
        }
        true
    }
}

impl MainQueueRunner {
    /// 대기 중인 작업을 모두 실행하고 실행 개수를 반환 (UI 프레임 루프용)
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            executed += 1;
        }
        executed
    }

    /// 다음 작업을 기다렸다가 실행. 모든 `MainQueue`가 drop되면 false.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// 모든 `MainQueue`가 drop될 때까지 실행
    pub async fn run(mut self) {
        while self.run_next().await {}
    }
}
