mod common;

use common::image_handle;
use vkstate::{
    vk::{self, Handle},
    BarrierSequenceError, ImageBarrier, ImageBarrierSequence, ImageSubresourceRange, NoWrapping, BATCH_ACQUIRE,
    BATCH_MAIN, BATCH_RESTORE_TRANSFERS, MAX_BATCH_COUNT, QUEUE_FAMILY_EXTERNAL,
};

fn barrier(image: u64, new_layout: vk::ImageLayout) -> ImageBarrier {
    ImageBarrier {
        image: image_handle(image),
        src_access_mask: vk::AccessFlags::empty(),
        dst_access_mask: vk::AccessFlags::SHADER_READ,
        old_layout: vk::ImageLayout::UNDEFINED,
        new_layout,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        subresource_range: ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR).levels(0, 1).layers(0, 1),
    }
}

#[test]
fn batches_are_extracted_in_order() {
    let mut seq = ImageBarrierSequence::new();
    seq.add_wrapped(BATCH_RESTORE_TRANSFERS, 0, barrier(3, vk::ImageLayout::GENERAL))
        .unwrap();
    seq.add_wrapped(BATCH_MAIN, 0, barrier(1, vk::ImageLayout::GENERAL)).unwrap();
    seq.add_wrapped(BATCH_MAIN, 0, barrier(2, vk::ImageLayout::GENERAL)).unwrap();
    seq.add_wrapped(BATCH_ACQUIRE, 1, barrier(4, vk::ImageLayout::GENERAL)).unwrap();
    assert_eq!(seq.len(), 4);

    let mut out = vec![];
    assert_eq!(
        seq.extract_first_unwrapped_batch_for_queue(0, &NoWrapping, &mut out),
        Some(BATCH_MAIN)
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].image, image_handle(1));
    assert_eq!(out[1].image, image_handle(2));

    out.clear();
    assert_eq!(
        seq.extract_last_unwrapped_batch_for_queue(0, &NoWrapping, &mut out),
        Some(BATCH_RESTORE_TRANSFERS)
    );
    assert_eq!(out.len(), 1);
    assert_eq!(seq.extract_first_unwrapped_batch_for_queue(0, &NoWrapping, &mut out), None);
    assert_eq!(seq.len(), 1);
    assert!(!seq.is_batch_empty(BATCH_ACQUIRE, 1));
}

#[test]
fn handles_are_unwrapped() {
    let mut seq = ImageBarrierSequence::new();
    seq.add_wrapped(BATCH_MAIN, 2, barrier(7, vk::ImageLayout::TRANSFER_DST_OPTIMAL))
        .unwrap();
    let unwrap = |image: vk::Image| vk::Image::from_raw(image.as_raw() + 100);
    let mut out = vec![];
    seq.extract_unwrapped_batch(BATCH_MAIN, 2, &unwrap, &mut out);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].image, image_handle(107));
    assert_eq!(out[0].new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(out[0].s_type, vk::StructureType::IMAGE_MEMORY_BARRIER);
    assert!(seq.is_empty());
}

#[test]
fn invalid_batches_and_queues_are_rejected() {
    let mut seq = ImageBarrierSequence::new();
    assert_eq!(
        seq.add_wrapped(MAX_BATCH_COUNT, 0, barrier(1, vk::ImageLayout::GENERAL)),
        Err(BarrierSequenceError::BatchOutOfRange {
            index: MAX_BATCH_COUNT,
            max: MAX_BATCH_COUNT
        })
    );
    assert_eq!(
        seq.add_wrapped(BATCH_MAIN, vk::QUEUE_FAMILY_IGNORED, barrier(1, vk::ImageLayout::GENERAL)),
        Err(BarrierSequenceError::ReservedQueueFamily(vk::QUEUE_FAMILY_IGNORED))
    );
    assert!(seq
        .add_wrapped(BATCH_MAIN, QUEUE_FAMILY_EXTERNAL, barrier(1, vk::ImageLayout::GENERAL))
        .is_err());
    assert!(seq.is_empty());
}

#[test]
fn merge_appends_per_queue() {
    let mut a = ImageBarrierSequence::with_queue_family_count(1);
    a.add_wrapped(BATCH_MAIN, 0, barrier(1, vk::ImageLayout::GENERAL)).unwrap();
    let mut b = ImageBarrierSequence::new();
    b.add_wrapped(BATCH_MAIN, 0, barrier(2, vk::ImageLayout::GENERAL)).unwrap();
    b.add_wrapped(BATCH_MAIN, 3, barrier(3, vk::ImageLayout::GENERAL)).unwrap();

    a.merge(&b);
    assert_eq!(a.len(), 3);
    let images: Vec<_> = a.batch(BATCH_MAIN, 0).iter().map(|b| b.image).collect();
    assert_eq!(images, vec![image_handle(1), image_handle(2)]);
    assert_eq!(a.batch(BATCH_MAIN, 3).len(), 1);
}

#[test]
fn vk_conversion_keeps_fields() {
    let b = barrier(5, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    let vk_barrier = b.to_vk(b.image);
    let back = ImageBarrier::from_vk(&vk_barrier);
    assert_eq!(back.new_layout, b.new_layout);
    assert_eq!(back.subresource_range.level_count, 1);
    assert_eq!(back.dst_access_mask, vk::AccessFlags::SHADER_READ);
}
