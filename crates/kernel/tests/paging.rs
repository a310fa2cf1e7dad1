mod common;

use common::*;
use kernel::{DiskRequest, KernelError, PageSource, Reason};
use types::{Opcode, Word};

fn dirty_writer() -> Vec<Word> {
    vec![
        w(Opcode::Ldi, 0, -1, 5),
        w(Opcode::Std, 0, -1, 12),
        w(Opcode::Ldi, 1, -1, 1),
        w(Opcode::Ldi, 2, -1, 2),
        w(Opcode::Ldi, 3, -1, 3),
        w(Opcode::Stop, -1, -1, -1),
    ]
}

fn far_reader() -> Vec<Word> {
    let mut image = vec![w(Opcode::Ldd, 1, -1, 50), w(Opcode::Stop, -1, -1, -1)];
    image.resize(51, Word::EMPTY);
    image[50] = Word::data(99);
    image
}

#[test]
fn test_dirty_victim_is_written_back_before_load() {
    let (kernel, _) = kernel_with_inputs(small_config(2), vec![]);
    let writer = kernel.create_process("writer", &dirty_writer()).expect("create");
    let reader = kernel.create_process("reader", &far_reader()).expect("create");

    // The writer dirties frame 0 and is preempted; the reader faults on page 3.
    step_until(&kernel, 50, |k| k.snapshot().blocked_vm.contains(&reader));

    let pending = kernel.pending_disk_requests();
    assert_eq!(pending.len(), 1);
    match &pending[0] {
        DiskRequest::PageOut {
            pid,
            page,
            frame,
            disk_address,
            words,
        } => {
            assert_eq!((*pid, *page, *frame, *disk_address), (writer, 0, 0, 0));
            assert_eq!(words[12], Word::data(5));
        }
        other => panic!("expected a write-back, got {:?}", other),
    }
    let frames = kernel.frames();
    assert_eq!(frames[0].waiter, Some((reader, 3)));
    assert!(frames[0].busy);

    let writer_table = kernel.page_table(writer).expect("writer");
    assert!(!writer_table[0].valid);
    assert!(writer_table[0].on_disk);

    // No load into frame 0 is queued while its write-back is pending.
    step_until(&kernel, 50, |k| {
        let pending = k.pending_disk_requests();
        let out_pending = pending
            .iter()
            .any(|r| matches!(r, DiskRequest::PageOut { frame: 0, .. }));
        let in_pending = pending
            .iter()
            .any(|r| matches!(r, DiskRequest::PageIn { frame: 0, .. }));
        assert!(!(out_pending && in_pending), "{:?}", pending);
        k.page_table(reader).map(|t| t[3].valid).unwrap_or(false)
    });

    let snap = kernel.snapshot();
    assert!(snap.ready.contains(&reader));
    let table = kernel.page_table(reader).expect("reader");
    assert_eq!(table[3].frame, 0);
    assert!(!table[0].valid);

    kernel.run_blocking().expect("run");
    assert!(kernel.snapshot().processes.is_empty());
    assert!(kernel.frames().iter().all(|f| f.is_free()));
}

#[test]
fn test_clean_victim_is_loaded_over() {
    let (kernel, _) = kernel_with_inputs(small_config(2), vec![]);
    let idle = kernel.create_process("idle", &straight_line(8)).expect("create");
    let reader = kernel.create_process("reader", &far_reader()).expect("create");

    step_until(&kernel, 50, |k| k.snapshot().blocked_vm.contains(&reader));

    let pending = kernel.pending_disk_requests();
    assert_eq!(pending.len(), 1);
    assert!(matches!(
        &pending[0],
        DiskRequest::PageIn { pid, page: 3, frame: 0, source: PageSource::Image(_) } if *pid == reader
    ));
    let frames = kernel.frames();
    assert_eq!(frames[0].owner, Some((reader, 3)));
    assert_eq!(frames[0].waiter, None);
    assert!(!kernel.page_table(idle).expect("idle")[0].valid);
}

#[test]
fn test_completion_for_removed_process_is_dropped() {
    let (kernel, _) = kernel_with_inputs(small_config(2), vec![]);
    let pid = kernel.spawn("pagefault").expect("spawn");

    step_until(&kernel, 20, |k| !k.pending_disk_requests().is_empty());
    kernel.remove_process(pid).expect("remove");

    // Frame 1 still has the transfer in flight and must not be handed out.
    let frames = kernel.frames();
    assert!(frames[1].busy);
    assert_eq!(frames[1].owner, None);
    let other = kernel.spawn("loop").expect("frame 0 is free");
    assert_eq!(kernel.spawn("loop"), Err(KernelError::OutOfFrames));

    // Draining the stale page-in releases the frame.
    assert!(kernel.step().expect("step"));
    assert!(kernel.pending_disk_requests().is_empty());
    let late = kernel.spawn("loop").expect("frame 1 released");
    assert_eq!(kernel.page_table(late).expect("late")[0].frame, 1);

    kernel.remove_process(other).expect("remove");
    kernel.remove_process(late).expect("remove");
    assert!(kernel.records().iter().any(|r| r.pid == pid && r.reason == Reason::Removed));
}
