use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use forever::{
    Config, DispatchFailurePolicy, Forever, ListenerError, OnCancel, TaskError, TaskFn, TaskRef,
    forever,
};
use tokio::sync::Notify;

/// Yields until `cond` holds, failing the test after a generous deadline.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Lets the background loop run for a while.
async fn spin(rounds: usize) {
    for _ in 0..rounds {
        tokio::task::yield_now().await;
    }
}

fn counting_ok() -> (TaskRef<Arc<AtomicUsize>>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let task: TaskRef<Arc<AtomicUsize>> =
        TaskFn::arc("counting-ok", |_oncancel, runs: Arc<AtomicUsize>| async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    (task, runs)
}

fn counting_fail() -> (TaskRef<Arc<AtomicUsize>>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let task: TaskRef<Arc<AtomicUsize>> =
        TaskFn::arc("counting-fail", |_oncancel, runs: Arc<AtomicUsize>| async move {
            let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
            Err(TaskError::fail(format!("failure #{n}")))
        });
    (task, runs)
}

#[tokio::test]
async fn succeeding_task_repeats_until_cancelled() {
    let (task, runs) = counting_ok();
    let handle = forever(task, Arc::clone(&runs));

    wait_until(|| runs.load(Ordering::SeqCst) >= 10).await;
    handle.cancel().await.unwrap();
    let at_cancel = runs.load(Ordering::SeqCst);

    spin(50).await;
    assert!(runs.load(Ordering::SeqCst) <= at_cancel + 1);
    assert!(!handle.is_running());
}

#[tokio::test]
async fn every_failure_reaches_every_listener_in_order() {
    let (task, runs) = counting_fail();
    let handle = forever(task, Arc::clone(&runs));

    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    for tag in ["first", "second"] {
        let log = Arc::clone(&log);
        handle.onerror().subscribe_fn(tag, move |err: TaskError| {
            log.lock().unwrap().push(format!("{tag}:{}", err.as_message()));
            async { Ok(()) }
        });
    }

    wait_until(|| runs.load(Ordering::SeqCst) >= 5).await;
    handle.cancel().await.unwrap();
    spin(10).await;

    let runs = runs.load(Ordering::SeqCst);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), runs * 2);
    for (i, pair) in log.chunks(2).enumerate() {
        assert_eq!(pair[0], format!("first:failure #{}", i + 1));
        assert_eq!(pair[1], format!("second:failure #{}", i + 1));
    }
}

#[tokio::test]
async fn repeated_cancel_broadcasts_once() {
    let (task, runs) = counting_ok();
    let handle = forever(task, runs);

    let broadcasts = Arc::new(AtomicUsize::new(0));
    let b = Arc::clone(&broadcasts);
    handle.oncancel().subscribe_fn("count", move |_| {
        b.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    let (a, b) = tokio::join!(handle.cancel(), handle.cancel());
    assert!(a.is_ok() && b.is_ok());
    handle.cancel().await.unwrap();

    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancel_from_many_threads_broadcasts_once() {
    let (task, runs) = counting_ok();
    let handle = forever(task, runs);

    let broadcasts = Arc::new(AtomicUsize::new(0));
    let b = Arc::clone(&broadcasts);
    handle.oncancel().subscribe_fn("count", move |_| {
        b.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    let joins: Vec<_> = (0..16)
        .map(|_| {
            let h = handle.clone();
            tokio::spawn(async move { h.cancel().await })
        })
        .collect();
    for j in joins {
        j.await.unwrap().unwrap();
    }

    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_before_first_run_prevents_it() {
    let (task, runs) = counting_ok();
    let handle = forever(task, Arc::clone(&runs));

    let pending = handle.cancel();
    spin(20).await;
    pending.await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failures_without_listeners_do_not_block() {
    let (task, runs) = counting_fail();
    let handle = forever(task, Arc::clone(&runs));

    wait_until(|| runs.load(Ordering::SeqCst) >= 100).await;
    assert!(handle.is_running());
    handle.cancel().await.unwrap();
}

#[tokio::test]
async fn third_run_fails_with_boom_and_loop_goes_on() {
    let counter = Arc::new(AtomicUsize::new(0));
    let task = TaskFn::arc("boom-on-3", |_oncancel, counter: Arc<AtomicUsize>| async move {
        let value = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if value == 3 {
            return Err(TaskError::fail("boom"));
        }
        Ok(())
    });
    let handle = forever(task, Arc::clone(&counter));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&errors);
    handle.onerror().subscribe_fn("collect", move |err: TaskError| {
        e.lock().unwrap().push(err);
        async { Ok(()) }
    });

    wait_until(|| counter.load(Ordering::SeqCst) >= 4).await;
    handle.cancel().await.unwrap();

    let errors = errors.lock().unwrap();
    assert_eq!(*errors, vec![TaskError::fail("boom")]);
    assert_eq!(errors[0].as_message(), "boom");
}

#[tokio::test]
async fn once_listener_fires_before_cancel_settles() {
    let flag = Arc::new(AtomicBool::new(false));
    let task = TaskFn::arc("waiter", |oncancel: OnCancel, flag: Arc<AtomicBool>| async move {
        let done = Arc::new(Notify::new());
        let d = Arc::clone(&done);
        oncancel.subscribe_once_fn("set-flag", move |_| {
            flag.store(true, Ordering::SeqCst);
            d.notify_one();
            async { Ok(()) }
        });
        done.notified().await;
        Ok(())
    });
    let handle = forever(task, Arc::clone(&flag));

    wait_until(|| handle.oncancel().listener_count() == 1).await;
    handle.cancel().await.unwrap();

    assert!(flag.load(Ordering::SeqCst));
}

#[tokio::test]
async fn in_flight_run_finishes_and_no_new_run_starts() {
    let runs = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));
    let fin = Arc::clone(&finished);

    let task = TaskFn::arc("long", move |oncancel: OnCancel, runs: Arc<AtomicUsize>| {
        let fin = Arc::clone(&fin);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            let stop = Arc::new(Notify::new());
            let s = Arc::clone(&stop);
            oncancel.subscribe_once_fn("stop", move |_| {
                s.notify_one();
                async { Ok(()) }
            });
            stop.notified().await;
            // Winding down after cancellation is still part of this run.
            tokio::task::yield_now().await;
            fin.store(true, Ordering::SeqCst);
            Ok(())
        }
    });
    let handle = forever(task, Arc::clone(&runs));

    wait_until(|| handle.oncancel().listener_count() == 1).await;
    handle.cancel().await.unwrap();
    assert!(!finished.load(Ordering::SeqCst));

    wait_until(|| finished.load(Ordering::SeqCst)).await;
    spin(20).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_task_is_reported_and_loop_continues() {
    let runs = Arc::new(AtomicUsize::new(0));
    let task = TaskFn::arc("panicky", |_oncancel, runs: Arc<AtomicUsize>| async move {
        if runs.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first run explodes");
        }
        Ok(())
    });
    let handle = forever(task, Arc::clone(&runs));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&errors);
    handle.onerror().subscribe_fn("collect", move |err: TaskError| {
        e.lock().unwrap().push(err);
        async { Ok(()) }
    });

    wait_until(|| runs.load(Ordering::SeqCst) >= 3).await;
    handle.cancel().await.unwrap();

    assert_eq!(
        *errors.lock().unwrap(),
        vec![TaskError::Panicked {
            info: "first run explodes".into()
        }]
    );
}

#[tokio::test]
async fn failing_error_listener_is_tolerated_by_default() {
    let (task, runs) = counting_fail();
    let handle = forever(task, Arc::clone(&runs));

    let delivered = Arc::new(AtomicUsize::new(0));
    handle
        .onerror()
        .subscribe_fn("broken", |_| async { Err(ListenerError::fail("sink down")) });
    let d = Arc::clone(&delivered);
    handle.onerror().subscribe_fn("after-broken", move |_| {
        d.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    wait_until(|| runs.load(Ordering::SeqCst) >= 10).await;
    assert!(handle.is_running());
    assert!(delivered.load(Ordering::SeqCst) >= 9);
    handle.cancel().await.unwrap();
}

#[tokio::test]
async fn stop_policy_ends_loop_on_failing_error_listener() {
    let cfg = Config {
        on_dispatch_failure: DispatchFailurePolicy::Stop,
        ..Config::default()
    };
    let (task, runs) = counting_fail();
    let handle = Forever::new(cfg).start(task, Arc::clone(&runs));

    let cancel_broadcasts = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&cancel_broadcasts);
    handle.oncancel().subscribe_fn("count", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });
    handle
        .onerror()
        .subscribe_fn("broken", |_| async { Err(ListenerError::fail("sink down")) });

    wait_until(|| !handle.is_running()).await;
    spin(20).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    handle.cancel().await.unwrap();
    assert_eq!(cancel_broadcasts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_reports_every_failing_listener() {
    let (task, runs) = counting_ok();
    let handle = forever(task, runs);

    let ran_last = Arc::new(AtomicBool::new(false));
    handle
        .oncancel()
        .subscribe_fn("a", |_| async { Err(ListenerError::fail("a broke")) });
    handle
        .oncancel()
        .subscribe_fn("b", |_| async { Err(ListenerError::fail("b broke")) });
    let r = Arc::clone(&ran_last);
    handle.oncancel().subscribe_fn("c", move |_| {
        r.store(true, Ordering::SeqCst);
        async { Ok(()) }
    });

    let err = handle.cancel().await.unwrap_err();

    assert!(ran_last.load(Ordering::SeqCst));
    assert_eq!(err.len(), 2);
    assert_eq!(err.first().listener, "a");
    assert_eq!(err.failures()[1].error, ListenerError::fail("b broke"));
    assert!(!handle.is_running());
}

#[tokio::test]
async fn same_notifier_is_passed_to_every_run() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let task = TaskFn::arc(
        "observer",
        |oncancel: OnCancel, seen: Arc<Mutex<Vec<usize>>>| async move {
            // Each run adds and removes one subscription on the shared notifier.
            let id = oncancel.subscribe_fn("per-run", |_| async { Ok(()) });
            seen.lock().unwrap().push(oncancel.listener_count());
            oncancel.unsubscribe(id);
            Ok(())
        },
    );
    let handle = forever(task, Arc::clone(&seen));
    handle.oncancel().subscribe_fn("outer", |_| async { Ok(()) });

    wait_until(|| seen.lock().unwrap().len() >= 3).await;
    handle.cancel().await.unwrap();

    assert!(seen.lock().unwrap().iter().all(|&n| n == 2));
}

#[tokio::test]
async fn uncaught_panic_drops_running_flag() {
    let cfg = Config {
        catch_panics: false,
        ..Config::default()
    };
    let runs = Arc::new(AtomicUsize::new(0));
    let task = TaskFn::arc("explodes", |_oncancel, runs: Arc<AtomicUsize>| async move {
        if runs.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("not caught");
        }
        Ok(())
    });
    let handle = Forever::new(cfg).start(task, Arc::clone(&runs));

    let cancel_broadcasts = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&cancel_broadcasts);
    handle.oncancel().subscribe_fn("count", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    wait_until(|| !handle.is_running()).await;
    spin(50).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    handle.cancel().await.unwrap();
    assert_eq!(cancel_broadcasts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn task_observes_cancel_that_raced_its_subscription() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let returned = Arc::new(AtomicBool::new(false));

    let (en, rel, ret) = (
        Arc::clone(&entered),
        Arc::clone(&release),
        Arc::clone(&returned),
    );
    let task = TaskFn::arc("late-subscriber", move |oncancel: OnCancel, _: ()| {
        let (en, rel, ret) = (Arc::clone(&en), Arc::clone(&rel), Arc::clone(&ret));
        async move {
            // Cancellation lands before this run subscribes.
            en.notify_one();
            rel.notified().await;

            let stop = Arc::new(Notify::new());
            let s = Arc::clone(&stop);
            oncancel.subscribe_once_fn("stop", move |_| {
                s.notify_one();
                async { Ok(()) }
            });
            if !oncancel.is_closed() {
                stop.notified().await;
            }
            ret.store(true, Ordering::SeqCst);
            Ok(())
        }
    });
    let handle = forever(task, ());

    entered.notified().await;
    handle.cancel().await.unwrap();
    release.notify_one();

    wait_until(|| returned.load(Ordering::SeqCst)).await;
    assert!(handle.oncancel().is_closed());
}
